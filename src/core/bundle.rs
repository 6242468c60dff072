use crate::domain::model::{Attribute, AttributeType, DEFAULT_ENCODING};
use crate::utils::error::{OcaError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

pub const CB_KEY: &str = "capture_base";
pub const OVERLAYS_KEY: &str = "overlays";
const TYPE_KEY: &str = "type";
const ATTR_KEY: &str = "attributes";
const FLAG_KEY: &str = "flagged_attributes";
const FORMAT_KEY: &str = "format";
const ATTR_FORMAT_KEY: &str = "attribute_formats";
const CONF_KEY: &str = "conformance";
const ATTR_CONF_KEY: &str = "attribute_conformance";
const EC_KEY: &str = "entry_code";
const ATTR_EC_KEY: &str = "attribute_entry_codes";
const CHE_KEY: &str = "character_encoding";
const ATTR_CHE_KEY: &str = "attribute_character_encoding";
const DEFAULT_ATTR_CHE_KEY: &str = "default_character_encoding";

// Legacy zip bundles
const META_FILE: &str = "meta.json";
const META_ROOT_KEY: &str = "root";
const META_FILES_KEY: &str = "files";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A loaded OCA bundle: the capture base plus its overlays, keyed by overlay name.
#[derive(Debug, Clone)]
pub struct OcaBundle {
    capture_base: Value,
    overlays: Map<String, Value>,
    attributes: Vec<Attribute>,
    entry_codes: BTreeMap<String, Vec<String>>,
}

impl OcaBundle {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(&data)
    }

    /// Loads either a JSON bundle or a legacy zip bundle, detected from the content.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.starts_with(ZIP_MAGIC) {
            Self::from_zip_bytes(data)
        } else {
            Self::from_json_bytes(data)
        }
    }

    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let bundle: Value = serde_json::from_slice(data)?;
        let mut bundle = match bundle {
            Value::Object(map) => map,
            _ => return Err(OcaError::bundle("bundle root must be a JSON object")),
        };

        let capture_base = bundle
            .remove(CB_KEY)
            .ok_or_else(|| OcaError::bundle(format!("missing '{}'", CB_KEY)))?;
        let overlays = match bundle.remove(OVERLAYS_KEY) {
            Some(Value::Object(overlays)) => overlays,
            Some(_) => return Err(OcaError::bundle(format!("'{}' must be an object", OVERLAYS_KEY))),
            None => {
                tracing::warn!("Bundle has no overlays; only attribute names will be validated");
                Map::new()
            }
        };

        Self::new(capture_base, overlays)
    }

    /// Loads a zip bundle whose `meta.json` names the capture base (`root`) and
    /// maps overlay names to file ids under `files[root]`.
    pub fn from_zip_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let meta = read_json_entry(&mut archive, META_FILE)?;

        let root = meta
            .get(META_ROOT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| OcaError::bundle(format!("'{}' has no '{}'", META_FILE, META_ROOT_KEY)))?
            .to_string();
        let files = meta
            .get(META_FILES_KEY)
            .and_then(|files| files.get(&root))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                OcaError::bundle(format!("'{}' has no file list for root {}", META_FILE, root))
            })?;

        let capture_base = read_json_entry(&mut archive, &format!("{}.json", root))?;
        let mut overlays = Map::new();
        for (name, file_id) in files {
            let file_id = file_id
                .as_str()
                .ok_or_else(|| OcaError::bundle(format!("file id of overlay '{}' is not a string", name)))?;
            let overlay = read_json_entry(&mut archive, &format!("{}.json", file_id))?;
            overlays.insert(name.clone(), overlay);
        }

        tracing::debug!("Loaded zip bundle {} with {} overlay file(s)", root, overlays.len());
        Self::new(capture_base, overlays)
    }

    pub fn new(capture_base: Value, overlays: Map<String, Value>) -> Result<Self> {
        let attributes = capture_base
            .get(ATTR_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| OcaError::bundle(format!("capture base has no '{}' object", ATTR_KEY)))?
            .iter()
            .map(|(name, type_value)| Attribute {
                name: name.clone(),
                attr_type: AttributeType::parse(type_value.as_str().unwrap_or_default()),
            })
            .collect();

        let mut entry_codes = BTreeMap::new();
        let declared = overlays
            .get(EC_KEY)
            .and_then(|overlay| overlay.get(ATTR_EC_KEY))
            .and_then(Value::as_object);
        for (name, codes) in declared.into_iter().flatten() {
            match codes.as_array() {
                Some(codes) => {
                    entry_codes.insert(name.clone(), codes.iter().map(json_to_text).collect());
                }
                None => tracing::warn!("Entry codes of attribute {} are not a list; ignored", name),
            }
        }

        Ok(Self {
            capture_base,
            overlays,
            attributes,
            entry_codes,
        })
    }

    pub fn capture_base(&self) -> &Value {
        &self.capture_base
    }

    /// Names of all loaded objects, the capture base first.
    pub fn overlay_names(&self) -> Vec<&str> {
        std::iter::once(CB_KEY)
            .chain(self.overlays.keys().map(String::as_str))
            .collect()
    }

    pub fn overlay(&self, name: &str) -> Result<&Value> {
        if name == CB_KEY {
            return Ok(&self.capture_base);
        }
        self.overlays
            .get(name)
            .ok_or_else(|| OcaError::bundle(format!("Wrong overlay name: {}", name)))
    }

    /// OCA specification version of an overlay, taken from the tail of its `type`.
    pub fn overlay_version(&self, name: &str) -> Option<String> {
        self.overlay(name)
            .ok()?
            .get(TYPE_KEY)?
            .as_str()?
            .rsplit('/')
            .next()
            .map(str::to_string)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_type(&self, name: &str) -> Option<&AttributeType> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.attr_type)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_type(name).is_some()
    }

    fn overlay_entry(&self, overlay: &str, key: &str, attribute: &str) -> Option<&Value> {
        self.overlays.get(overlay)?.get(key)?.get(attribute)
    }

    pub fn attribute_format(&self, name: &str) -> Option<&str> {
        self.overlay_entry(FORMAT_KEY, ATTR_FORMAT_KEY, name)
            .and_then(Value::as_str)
    }

    pub fn is_mandatory(&self, name: &str) -> bool {
        self.overlay_entry(CONF_KEY, ATTR_CONF_KEY, name)
            .and_then(Value::as_str)
            .is_some_and(|conformance| conformance == "M")
    }

    pub fn entry_codes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entry_codes
    }

    pub fn has_entry_codes(&self, name: &str) -> bool {
        self.entry_codes.contains_key(name)
    }

    /// Per-attribute encoding, else the overlay default, else utf-8.
    pub fn character_encoding(&self, name: &str) -> String {
        self.character_encoding_or(name, DEFAULT_ENCODING)
    }

    /// Per-attribute encoding, else the overlay default, else `fallback`.
    pub fn character_encoding_or(&self, name: &str, fallback: &str) -> String {
        let overlay = self.overlays.get(CHE_KEY);
        overlay
            .and_then(|o| o.get(ATTR_CHE_KEY))
            .and_then(|encodings| encodings.get(name))
            .and_then(Value::as_str)
            .filter(|encoding| !encoding.is_empty())
            .or_else(|| {
                overlay
                    .and_then(|o| o.get(DEFAULT_ATTR_CHE_KEY))
                    .and_then(Value::as_str)
                    .filter(|encoding| !encoding.is_empty())
            })
            .unwrap_or(fallback)
            .to_string()
    }

    pub fn flagged_attributes(&self) -> Vec<String> {
        self.capture_base
            .get(FLAG_KEY)
            .and_then(Value::as_array)
            .map(|flags| flags.iter().map(json_to_text).collect())
            .unwrap_or_default()
    }
}

fn read_json_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Value> {
    let mut entry = archive.by_name(name)?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Text form of a JSON scalar: strings without quotes, everything else as JSON.
pub(crate) fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
