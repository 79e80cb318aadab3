//! Localized string tables (statictext.xml -> .json, .pot, .<lang>.po)

use anyhow::{Context, Result};
use hashbrown::HashMap;
use serde_json::{Map, Value as Json};
use std::path::{Path, PathBuf};

use crate::formats::{self, po};
use crate::xml;

/// Language used for the template catalog
pub const TEMPLATE_LANGUAGE: &str = "en";

/// One language's messages, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub code: String,
    pub messages: Vec<(String, String)>,
}

/// Every language of a string table, in document order
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    pub languages: Vec<Language>,
}

impl StringTable {
    pub fn parse(text: &str) -> Result<Self> {
        let doc = xml::parse(text)?;
        let languages = doc
            .root_element()
            .children()
            .filter(|n| n.is_element())
            .map(|language| {
                let code = match language.attribute("key").unwrap_or_default() {
                    "" => TEMPLATE_LANGUAGE.to_string(),
                    code => code.to_string(),
                };
                let mut messages: Vec<(String, String)> = Vec::new();
                let mut index: HashMap<String, usize> = HashMap::new();
                for entry in xml::find_all(language, "Dict/Entry") {
                    let key = xml::attr(entry, "key")?;
                    let text = xml::text(entry).to_string();
                    match index.get(key) {
                        Some(&at) => {
                            tracing::warn!("Duplicate key '{}' in language '{}', keeping the last", key, code);
                            messages[at].1 = text;
                        }
                        None => {
                            index.insert(key.to_string(), messages.len());
                            messages.push((key.to_string(), text));
                        }
                    }
                }
                Ok(Language { code, messages })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { languages })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = xml::read_text(path)?;
        tracing::info!("Reading string table {:?}", path);
        Self::parse(&text).with_context(|| format!("In string table {:?}", path))
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Language the template is built from: `en`, else the first one
    pub fn template_language(&self) -> Option<&Language> {
        self.language(TEMPLATE_LANGUAGE).or_else(|| {
            let first = self.languages.first()?;
            tracing::warn!(
                "No '{}' strings, building the template from '{}'",
                TEMPLATE_LANGUAGE,
                first.code
            );
            Some(first)
        })
    }

    /// `{ lang: { key: text } }`, keeping document order
    pub fn to_json(&self) -> Json {
        let languages: Map<String, Json> = self
            .languages
            .iter()
            .map(|language| {
                let messages: Map<String, Json> = language
                    .messages
                    .iter()
                    .map(|(key, text)| (key.clone(), Json::String(text.clone())))
                    .collect();
                (language.code.clone(), Json::Object(messages))
            })
            .collect();
        Json::Object(languages)
    }
}

/// `dir/name.xml` -> `dir/name.<lang>.po`
pub fn po_path(input: &Path, language: &str) -> PathBuf {
    input.with_extension(format!("{}.po", language))
}

/// Write the JSON dump, the template and one catalog per language
pub fn convert_text(input: &Path, headers: &Path) -> Result<()> {
    let table = StringTable::load(input)?;
    let headers = std::fs::read_to_string(headers)
        .with_context(|| format!("Failed to read PO headers: {:?}", headers))?
        .replace("\r\n", "\n");

    formats::write_json(&input.with_extension("json"), &table.to_json())?;

    if let Some(template) = table.template_language() {
        let ids = template.messages.iter().map(|(key, _)| key.as_str());
        formats::write_text(&input.with_extension("pot"), &po::template(ids))?;
    }

    for language in &table.languages {
        let header = po::find_header(&headers, &language.code).unwrap_or_else(|| {
            tracing::warn!("No PO header for language '{}'", language.code);
            ""
        });
        let messages = language.messages.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        formats::write_text(&po_path(input, &language.code), &po::catalog(header, messages))?;
    }

    tracing::info!("Exported {} languages", table.languages.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"<StaticText>
  <Language key="">
    <Dict>
      <Entry key="HELLO">Hello</Entry>
      <Entry key="BYE">Bye&#13;
now</Entry>
    </Dict>
  </Language>
  <Language key="fr">
    <Dict>
      <Entry key="HELLO">Bonjour</Entry>
      <Entry key="EMPTY"/>
    </Dict>
  </Language>
</StaticText>"#;

    #[test]
    fn test_parse() {
        let table = StringTable::parse(TABLE).unwrap();
        assert_eq!(table.languages.len(), 2);
        assert_eq!(table.languages[0].code, "en");
        assert_eq!(table.languages[0].messages[1], ("BYE".to_string(), "Bye\r\nnow".to_string()));
        assert_eq!(table.language("fr").unwrap().messages[1].1, "");
    }

    #[test]
    fn test_json_keeps_order() {
        let table = StringTable::parse(TABLE).unwrap();
        let json = serde_json::to_string(&table.to_json()).unwrap();
        assert_eq!(
            json,
            r#"{"en":{"HELLO":"Hello","BYE":"Bye\r\nnow"},"fr":{"HELLO":"Bonjour","EMPTY":""}}"#
        );
    }

    #[test]
    fn test_template_fallback() {
        let table = StringTable::parse(&TABLE.replace("key=\"\"", "key=\"de\"")).unwrap();
        assert_eq!(table.template_language().unwrap().code, "de");
        assert!(StringTable::default().template_language().is_none());
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let text = TABLE.replace(
            "<Entry key=\"EMPTY\"/>",
            "<Entry key=\"EMPTY\"/>\n      <Entry key=\"HELLO\">Salut</Entry>",
        );
        let table = StringTable::parse(&text).unwrap();
        let fr = table.language("fr").unwrap();
        assert_eq!(
            fr.messages,
            vec![
                ("HELLO".to_string(), "Salut".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
        assert_eq!(table.to_json()["fr"]["HELLO"], "Salut");
    }

    #[test]
    fn test_convert_crlf_headers() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statictext.xml");
        let headers = dir.path().join("headers.po");
        std::fs::write(&input, TABLE).unwrap();
        std::fs::write(
            &headers,
            "msgid \"\"\r\nmsgstr \"\"\r\n\"Language: en\\n\"\r\n\r\nmsgid \"\"\r\nmsgstr \"\"\r\n\"Language: fr\\n\"\r\n",
        )
        .unwrap();

        convert_text(&input, &headers).unwrap();
        let fr = std::fs::read_to_string(po_path(&input, "fr")).unwrap();
        assert!(fr.starts_with("msgid \"\"\nmsgstr \"\"\n\"Language: fr\\n\"\n\nmsgid \"HELLO\""));
        assert!(!fr.contains("Language: en"));
        assert!(!fr.contains('\r'));
    }

    #[test]
    fn test_po_path() {
        assert_eq!(po_path(Path::new("a/statictext.xml"), "fr"), Path::new("a/statictext.fr.po"));
    }
}
