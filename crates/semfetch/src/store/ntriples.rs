// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! N-Triples output for write-back.
//!
//! N-Triples is a strict subset of Turtle and N3, so the same text serves all
//! three content types on upload.

use super::{vocab, Statement, Term};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cannot serialize to content type {0}")]
    Unsupported(String),
}

/// Content types the write path can produce.
pub fn can_serialize(content_type: &str) -> bool {
    let ct = content_type.split(';').next().unwrap_or("").trim();
    matches!(
        ct.to_ascii_lowercase().as_str(),
        "text/turtle" | "text/n3" | "application/n-triples" | "application/x-turtle"
    )
}

/// Serialize statements for upload as `content_type`.
pub fn serialize(statements: &[Statement], content_type: &str) -> Result<String, SerializeError> {
    if !can_serialize(content_type) {
        return Err(SerializeError::Unsupported(content_type.to_string()));
    }
    let mut out = String::new();
    for st in statements {
        out.push_str(&format!(
            "{} {} {} .\n",
            term_to_nt(&st.subject),
            term_to_nt(&st.predicate),
            term_to_nt(&st.object)
        ));
    }
    Ok(out)
}

pub fn term_to_nt(term: &Term) -> String {
    match term {
        Term::Named(iri) => format!("<{iri}>"),
        Term::Blank(label) => format!("_:{label}"),
        Term::Literal(lit) => {
            let mut s = format!("\"{}\"", escape(&lit.value));
            if let Some(lang) = &lit.lang {
                s.push('@');
                s.push_str(lang);
            } else if let Some(dt) = &lit.datatype {
                if Term::named(dt.clone()) != vocab::xsd("string") {
                    s.push_str(&format!("^^<{dt}>"));
                }
            }
            s
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
