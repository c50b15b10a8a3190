//! Histogram to counts conversion.
//!
//! IonQ returns a probability per outcome, keyed by the outcome as a decimal
//! integer in which bit `q` is the value of qubit `q`. The circuit's
//! measurements, recorded at submission time in `metadata.output_map`, say
//! which qubit feeds which classical bit. Counts are keyed by the classical
//! register, one character per memory slot with clbit 0 rightmost.

use serde_json::Value;

use arvak_hal::Counts;

use crate::error::{IonQError, IonQResult};

/// Shot count assumed when the job document does not carry one.
pub const DEFAULT_SHOTS: u64 = 1024;

/// Widest classical register accepted in a job document.
pub const MAX_MEMORY_SLOTS: usize = 1024;

fn job_error(msg: impl Into<String>) -> IonQError {
    IonQError::JobError(msg.into())
}

/// Convert a completed job document into counts.
pub fn remap_counts(doc: Option<&Value>) -> IonQResult<Counts> {
    let doc = match doc {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(job_error("Cannot remap counts without an API response!")),
    };
    let qubits = doc
        .get("qubits")
        .ok_or_else(|| job_error("Cannot remap counts without qubits!"))?;
    let metadata = doc
        .get("metadata")
        .ok_or_else(|| job_error("Cannot remap counts without metadata!"))?;
    let histogram = doc
        .get("data")
        .and_then(|d| d.get("histogram"))
        .ok_or_else(|| job_error("Cannot remap counts without result data!"))?;

    let num_qubits = as_index(qubits)
        .ok_or_else(|| job_error(format!("Invalid qubit count in job result: {qubits}")))?;
    let shots = shots_from_metadata(metadata)?;
    let width = memory_slots(metadata)?.unwrap_or(num_qubits);
    if width > MAX_MEMORY_SLOTS {
        return Err(job_error(format!(
            "Register width {width} exceeds the maximum of {MAX_MEMORY_SLOTS}"
        )));
    }
    let pairs = match metadata.get("output_map") {
        Some(raw) => output_map_pairs(raw)?,
        None => (0..num_qubits.min(width)).map(|q| (q, q)).collect(),
    };

    let histogram = histogram
        .as_object()
        .ok_or_else(|| job_error("Result histogram is not an object"))?;

    let mut counts = Counts::new();
    for (outcome, weight) in histogram {
        let outcome: u64 = outcome
            .parse()
            .map_err(|_| job_error(format!("Invalid outcome '{outcome}' in histogram")))?;
        let weight = weight
            .as_f64()
            .ok_or_else(|| job_error(format!("Invalid probability {weight} in histogram")))?;

        let mut clbits = vec![false; width];
        for &(qubit, clbit) in &pairs {
            if clbit < width {
                clbits[clbit] = qubit < 64 && (outcome >> qubit) & 1 == 1;
            }
        }
        let bitstring: String = clbits
            .iter()
            .rev()
            .map(|&b| if b { '1' } else { '0' })
            .collect();

        counts.insert(bitstring, (weight * shots as f64).round() as u64);
    }
    Ok(counts)
}

/// Shot count recorded in the job metadata, or [`DEFAULT_SHOTS`].
///
/// IonQ echoes metadata values back as strings, so both `100` and `"100"`
/// are accepted.
pub fn shots_from_metadata(metadata: &Value) -> IonQResult<u64> {
    match metadata.get("shots") {
        None | Some(Value::Null) => Ok(DEFAULT_SHOTS),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| job_error(format!("Invalid shot count: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| job_error(format!("Invalid shot count: '{s}'"))),
        Some(other) => Err(job_error(format!("Invalid shot count: {other}"))),
    }
}

/// Classical register width from `metadata.header.memory_slots`, if present.
fn memory_slots(metadata: &Value) -> IonQResult<Option<usize>> {
    let Some(header) = metadata.get("header") else {
        return Ok(None);
    };
    let header = decode_embedded(header, "header")?;
    match header.get("memory_slots") {
        None | Some(Value::Null) => Ok(None),
        Some(slots) => as_index(slots)
            .map(Some)
            .ok_or_else(|| job_error(format!("Invalid memory_slots in header: {slots}"))),
    }
}

/// Normalize an output map to `(qubit, clbit)` pairs.
///
/// Two shapes are accepted: an object `{"<qubit>": <clbit>}`, or a list
/// indexed by clbit whose entries are the measured qubit or `null`.
fn output_map_pairs(raw: &Value) -> IonQResult<Vec<(usize, usize)>> {
    let invalid = |what: &str| job_error(format!("Invalid output_map: {what}"));

    match decode_embedded(raw, "output_map")? {
        Value::Object(map) => map
            .iter()
            .map(|(qubit, clbit)| {
                let qubit: usize = qubit
                    .parse()
                    .map_err(|_| invalid(&format!("qubit key '{qubit}'")))?;
                let clbit = as_index(clbit).ok_or_else(|| invalid(&format!("clbit {clbit}")))?;
                Ok((qubit, clbit))
            })
            .collect(),
        Value::Array(list) => list
            .iter()
            .enumerate()
            .filter(|(_, qubit)| !qubit.is_null())
            .map(|(clbit, qubit)| {
                let qubit = as_index(qubit).ok_or_else(|| invalid(&format!("qubit {qubit}")))?;
                Ok((qubit, clbit))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(invalid(&other.to_string())),
    }
}

/// Metadata fields may arrive as JSON text or as already-decoded JSON.
fn decode_embedded(value: &Value, field: &str) -> IonQResult<Value> {
    match value {
        Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| job_error(format!("Invalid JSON in metadata {field}: {e}"))),
        other => Ok(other.clone()),
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}
