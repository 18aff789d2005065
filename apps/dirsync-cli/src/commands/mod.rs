//! Subcommand implementations

pub mod apply;
pub mod inspect;
pub mod list;

use std::path::PathBuf;

use dirsync_connector_ldap::LdapClient;
use dirsync_provisioning::{Intent, IntentExtractor, ProvisioningEngine, XmlIntentExtractor};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Extract one intent per file, keeping the given order.
///
/// Any unreadable document aborts before the directory is touched.
pub(crate) fn extract_all(files: &[PathBuf]) -> CliResult<Vec<(PathBuf, Intent)>> {
    let extractor = XmlIntentExtractor::new();
    files
        .iter()
        .map(|path| {
            extractor
                .extract_file(path)
                .map(|intent| (path.clone(), intent))
                .map_err(|source| {
                    warn!(path = %path.display(), code = source.error_code(), "Unusable change document");
                    CliError::Document {
                        path: path.display().to_string(),
                        source,
                    }
                })
        })
        .collect()
}

pub(crate) fn engine(config: &AppConfig) -> ProvisioningEngine<LdapClient> {
    let client = LdapClient::new(config.directory.clone());
    ProvisioningEngine::new(client, config.directory.clone())
}

pub(crate) async fn close(engine: &mut ProvisioningEngine<LdapClient>) {
    if let Err(e) = engine.disconnect().await {
        warn!(error = %e, "Failed to close directory session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("b-group.xml");
        let user = dir.path().join("a-user.xml");
        std::fs::write(
            &group,
            r#"<add><add-attr attr-name="Identificador"><value>devs</value></add-attr></add>"#,
        )
        .unwrap();
        std::fs::write(
            &user,
            r#"<add><add-attr attr-name="Login"><value>asilva</value></add-attr>
               <add-attr attr-name="Nome Completo"><value>Ana Silva</value></add-attr></add>"#,
        )
        .unwrap();

        let intents = extract_all(&[group.clone(), user]).unwrap();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].0, group);
        assert_eq!(intents[0].1.kind(), "add_group");
        assert_eq!(intents[1].1.kind(), "add_user");
    }

    #[test]
    fn test_demo_documents() {
        let inputs = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/inputs");
        let files: Vec<PathBuf> = [
            "AddGrupo1.xml",
            "AddGrupo2.xml",
            "AddGrupo3.xml",
            "AddUsuario1.xml",
            "ModifyUsuario.xml",
        ]
        .iter()
        .map(|name| inputs.join(name))
        .collect();

        let intents = extract_all(&files).unwrap();
        let kinds: Vec<&str> = intents.iter().map(|(_, intent)| intent.kind()).collect();
        assert_eq!(
            kinds,
            vec!["add_group", "add_group", "add_group", "add_user", "modify_membership"]
        );
        assert_eq!(
            intents[3].1,
            Intent::AddUser {
                uid: "jsouza".into(),
                full_name: "Joao da Silva Souza".into(),
                phone: "(21) 98765-4321".into(),
                group_ids: vec!["Grupo1".into(), "Grupo2".into()],
            }
        );
    }

    #[test]
    fn test_extract_all_reports_bad_document() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.xml");
        std::fs::write(&bad, "<add/>").unwrap();

        let err = extract_all(&[bad]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("bad.xml"));
    }
}
