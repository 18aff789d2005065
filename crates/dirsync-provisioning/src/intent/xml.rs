//! XML change-document extractor
//!
//! Reads identity-manager style documents:
//!
//! ```xml
//! <nds>
//!   <input>
//!     <add class-name="User">
//!       <add-attr attr-name="Login"><value>asilva</value></add-attr>
//!       <add-attr attr-name="Nome Completo"><value>Ana Silva</value></add-attr>
//!       <add-attr attr-name="Telefone"><value>(21) 91234-5678</value></add-attr>
//!       <add-attr attr-name="Grupo"><value>devs</value></add-attr>
//!     </add>
//!   </input>
//! </nds>
//! ```
//!
//! Membership changes use `<modify>` with an `<association>` naming the user
//! and `remove-value/value` / `add-value/value` lists of group identifiers.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use super::{Intent, IntentExtractor};
use crate::error::{ExtractError, ExtractResult};

const LOGIN: &str = "Login";
const FULL_NAME: &str = "Nome Completo";
const PHONE: &str = "Telefone";
const GROUP: &str = "Grupo";
const GROUP_ID: &str = "Identificador";
const GROUP_DESCRIPTION: &str = "Descricao";

/// Extracts intents from XML change documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlIntentExtractor;

impl XmlIntentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl IntentExtractor for XmlIntentExtractor {
    fn extract(&self, document: &str) -> ExtractResult<Intent> {
        let collected = Collected::parse(document)?;
        let intent = collected.into_intent()?;
        debug!(kind = intent.kind(), subject = intent.subject(), "Extracted intent");
        Ok(intent)
    }
}

/// Everything of interest found in one document.
#[derive(Debug, Default)]
struct Collected {
    saw_modify: bool,
    /// `add-attr` values keyed by `attr-name`, in document order.
    attrs: Vec<(String, Vec<String>)>,
    association: Option<String>,
    remove_values: Vec<String>,
    add_values: Vec<String>,

    stack: Vec<String>,
    current_attr: Option<String>,
    capture: Option<String>,
}

impl Collected {
    fn parse(document: &str) -> ExtractResult<Self> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut collected = Self::default();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = local_name(e.local_name().into_inner());
                    collected.open(&name, e);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = local_name(e.local_name().into_inner());
                    collected.open(&name, e);
                    collected.close(&name);
                }
                Ok(Event::End(ref e)) => {
                    let name = local_name(e.local_name().into_inner());
                    collected.close(&name);
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(ExtractError::malformed)?;
                    collected.text(&text);
                }
                Ok(Event::CData(ref e)) => {
                    collected.text(&String::from_utf8_lossy(e));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ExtractError::malformed(format!(
                        "XML parse error at position {}: {e}",
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(collected)
    }

    fn open(&mut self, name: &str, start: &BytesStart<'_>) {
        match name {
            "modify" => self.saw_modify = true,
            "add-attr" => {
                let attr = attr_name(start);
                if let Some(attr) = &attr {
                    if !self.attrs.iter().any(|(k, _)| k == attr) {
                        self.attrs.push((attr.clone(), Vec::new()));
                    }
                }
                self.current_attr = attr;
            }
            "value" | "association" => self.capture = Some(String::new()),
            _ => {}
        }
        self.stack.push(name.to_string());
    }

    fn text(&mut self, text: &str) {
        if let Some(buf) = self.capture.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self, name: &str) {
        self.stack.pop();
        match name {
            "value" => {
                let Some(text) = self.capture.take() else {
                    return;
                };
                match self.stack.last().map(String::as_str) {
                    Some("add-attr") => {
                        if let Some(attr) = &self.current_attr {
                            if let Some((_, values)) =
                                self.attrs.iter_mut().find(|(k, _)| k == attr)
                            {
                                values.push(text);
                            }
                        }
                    }
                    Some("remove-value") => self.remove_values.push(text),
                    Some("add-value") => self.add_values.push(text),
                    _ => {}
                }
            }
            "association" => {
                if let Some(text) = self.capture.take() {
                    if self.association.is_none() {
                        self.association = Some(text.trim().to_string());
                    }
                }
            }
            "add-attr" => self.current_attr = None,
            _ => {}
        }
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// First value of a required attribute.
    fn single(&self, name: &'static str) -> ExtractResult<String> {
        self.values(name)
            .first()
            .map(|v| v.trim().to_string())
            .ok_or(ExtractError::MissingField { field: name })
    }

    fn optional(&self, name: &str) -> String {
        self.values(name)
            .first()
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn into_intent(self) -> ExtractResult<Intent> {
        if self.saw_modify || (self.association.is_some() && self.attrs.is_empty()) {
            let uid = self
                .association
                .filter(|a| !a.is_empty())
                .ok_or(ExtractError::MissingField {
                    field: "association",
                })?;
            return Ok(Intent::ModifyMembership {
                uid,
                groups_to_remove: non_blank(self.remove_values),
                groups_to_add: non_blank(self.add_values),
            });
        }

        if self.has_attr(LOGIN) {
            return Ok(Intent::AddUser {
                uid: self.single(LOGIN)?,
                full_name: self.single(FULL_NAME)?,
                phone: self.optional(PHONE),
                group_ids: non_blank(self.values(GROUP).to_vec()),
            });
        }

        if self.has_attr(GROUP_ID) {
            return Ok(Intent::AddGroup {
                identifier: self.single(GROUP_ID)?,
                description: self.optional(GROUP_DESCRIPTION),
            });
        }

        Err(ExtractError::Unsupported)
    }
}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

fn attr_name(start: &BytesStart<'_>) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().into_inner() == b"attr-name")
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
        })
}

/// Trim every value and drop the blank ones.
fn non_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
