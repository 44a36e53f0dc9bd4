//! Matches model-cited references back to the candidates of a request.
//!
//! Metadata is compared through a stable identity key: the SHA-256 of its
//! canonical JSON form (object keys sorted at every level, whole-valued
//! floats written as integers), so field order and `2` versus `2.0` never
//! affect a match.

use crate::types::{ReconciledHit, Reference};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Identity key of a metadata value.
pub fn reference_key(metadata: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(metadata, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(number) => write_number(number, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Whole-valued floats are written as integers so `2` and `2.0` share a key.
fn write_number(number: &serde_json::Number, out: &mut String) {
    if number.is_f64() {
        if let Some(f) = number.as_f64() {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                out.push_str(&(f as i64).to_string());
                return;
            }
        }
    }
    out.push_str(&number.to_string());
}

/// Hydrates raw hits from the candidate list.
///
/// A hit matches a candidate when the hit itself, or the hit's `metadata`
/// field, equals the candidate's metadata. The earliest matching candidate
/// wins. Unmatched hits are kept verbatim as `ReconciledHit::Unverified`.
#[derive(Debug)]
pub struct ReferenceReconciler<'a> {
    candidates: &'a [Reference],
    index: HashMap<String, usize>,
}

impl<'a> ReferenceReconciler<'a> {
    pub fn new(candidates: &'a [Reference]) -> Self {
        let mut index = HashMap::new();
        for (position, candidate) in candidates.iter().enumerate() {
            index
                .entry(reference_key(&candidate.metadata))
                .or_insert(position);
        }

        Self { candidates, index }
    }

    /// Position of the first candidate matching `hit`.
    fn lookup(&self, hit: &Value) -> Option<usize> {
        let direct = self.index.get(&reference_key(hit)).copied();
        let nested = hit
            .get("metadata")
            .and_then(|metadata| self.index.get(&reference_key(metadata)).copied());

        match (direct, nested) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn reconcile(&self, raw_hits: &[Value]) -> Vec<ReconciledHit> {
        let hits: Vec<ReconciledHit> = raw_hits
            .iter()
            .map(|hit| match self.lookup(hit) {
                Some(position) => ReconciledHit::Verified(self.candidates[position].clone()),
                None => ReconciledHit::Unverified(hit.clone()),
            })
            .collect();

        let verified = hits.iter().filter(|h| h.is_verified()).count();
        let unverified = hits.len() - verified;
        if unverified > 0 {
            tracing::warn!(verified, unverified, "Some cited references match no candidate");
        } else {
            tracing::debug!(verified, "All cited references matched");
        }

        hits
    }
}

/// Reconcile `raw_hits` against `candidates` in one call.
pub fn reconcile(raw_hits: &[Value], candidates: &[Reference]) -> Vec<ReconciledHit> {
    ReferenceReconciler::new(candidates).reconcile(raw_hits)
}
