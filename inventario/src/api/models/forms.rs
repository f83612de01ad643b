//! URL-encoded form bodies posted by the HTML pages.
//!
//! The creation form repeats `n_serie_multiplos[]` once per serial number, which a plain
//! struct extractor cannot represent, so bodies are parsed into an ordered multimap first.

use crate::codec::{AssetDraft, RowPosition};
use crate::errors::{Error, Result};
use crate::service::{CommonFields, SerialMode, Submission};

/// `serial_igual` value meaning every unit shares one serial number.
pub const SAME_SERIAL: &str = "sim";

/// Form fields in the order they were posted. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        Self(url::form_urlencoded::parse(body).into_owned().collect())
    }

    /// First value posted under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value posted under `key`, in order.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.clone()).collect()
    }

    fn required(&self, key: &str) -> Result<String> {
        self.first(key)
            .map(str::to_string)
            .ok_or_else(|| Error::bad_request(format!("Campo obrigatório ausente: {key}")))
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.first(key).map(str::to_string)
    }

    /// Interpret the fields as a new-item submission.
    pub fn into_submission(self) -> Result<Submission> {
        let common = CommonFields {
            unit: self.required("unidade")?,
            category: self.required("categoria")?,
            description: self.required("descricao")?,
            brand: self.required("marca")?,
            condition: self.required("estado")?,
        };

        let mode = if self.first("serial_igual") == Some(SAME_SERIAL) {
            SerialMode::SameSerial {
                serial: self.required("n_serie_unico")?,
                quantity: self.quantity()?,
            }
        } else {
            SerialMode::DistinctSerials {
                serials: self.all("n_serie_multiplos[]"),
            }
        };

        Ok(Submission { common, mode })
    }

    fn quantity(&self) -> Result<u32> {
        match self.first("quantidade").map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::bad_request(format!("Quantidade inválida: {raw}"))),
        }
    }

    /// Interpret the fields as an edit of an existing row.
    pub fn into_update(self) -> Result<(RowPosition, AssetDraft)> {
        let raw = self.required("row_number")?;
        let position = raw
            .trim()
            .parse()
            .map_err(|_| Error::bad_request(format!("Número de linha inválido: {raw}")))?;

        let draft = AssetDraft {
            unit: self.optional("unidade"),
            category: self.optional("categoria"),
            description: self.optional("descricao"),
            brand: self.optional("marca"),
            serial_number: self.optional("n_serie"),
            condition: self.optional("estado"),
            recorded_at: self.optional("timestamp"),
        };
        Ok((position, draft))
    }
}
