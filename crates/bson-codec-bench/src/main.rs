//! Benchmark for document encoding, decoding and identifier generation.
//!
//! Usage: `bench-codec [--json] [iterations] [json-file]`
//!
//! Without a file, a document holding one value of every supported kind is
//! used. With a file, its JSON content is converted to a document first.

use std::fs;
use std::time::{Duration, Instant};

use bson_codec::{
    decode_document, default_generator, encode_document, AsBson, Binary, BinarySubtype,
    DbRef, Document, DocumentBuilder, ObjectId, Regex, Timestamp, Value,
};
use serde::Serialize;

const DEFAULT_ITERATIONS: u32 = 100_000;
const WARMUP_ITERATIONS: u32 = 1_000;

// =============================================================================
// INPUT DOCUMENTS
// =============================================================================

/// Host object converted through the hook on every encode.
struct Answer;

impl AsBson for Answer {
    fn as_bson(&self) -> Option<Value> {
        Some(Value::Int32(69))
    }
}

fn benchmark_document() -> Document {
    let now_millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    DocumentBuilder::new()
        .array("array", |a| a.push(1).push(2).push(3))
        .binary(
            "binary",
            Binary::with_subtype(BinarySubtype::ByteArray, vec![1, 2, 3]),
        )
        .field("boolean", true)
        .field("custom", Value::custom(Answer))
        .code_with_scope("code", "this.x == 3", |s| s.field("foo", "bar"))
        .date("date", now_millis)
        .db_ref("dbref", DbRef::new("foo", ObjectId::new()))
        .document("document", |d| d.field("a", 1).field("b", 2))
        .field("float", 33.3333)
        .field("int", 42)
        .field("minkey", Value::MinKey)
        .field("maxkey", Value::MaxKey)
        .null("null")
        .object_id("oid", ObjectId::new())
        .document("ordered", |d| d.field("foo", "bar").field("1", "baz"))
        .field("regexp", Regex::new("foobar", "i"))
        .field("string", "hello")
        .symbol("symbol", "hello")
        .field("timestamp", Timestamp::new(1, 1))
        .field("undefined", Value::Undefined)
        .build()
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::integer(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => Value::Document(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

fn load_json_document(path: &str) -> Document {
    let text = fs::read_to_string(path).expect("Failed to read JSON file");
    let json: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse JSON");
    match json_to_value(json) {
        Value::Document(doc) => doc,
        other => DocumentBuilder::new().field("root", other).build(),
    }
}

// =============================================================================
// REPORTING
// =============================================================================

#[derive(Debug, Serialize)]
struct Timing {
    total_ms: f64,
    per_op_ns: f64,
    ops_per_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mb_per_sec: Option<f64>,
}

impl Timing {
    fn new(elapsed: Duration, iterations: u32, bytes_per_op: Option<usize>) -> Self {
        let secs = elapsed.as_secs_f64();
        let ops = iterations as f64;
        Self {
            total_ms: secs * 1_000.0,
            per_op_ns: secs * 1e9 / ops,
            ops_per_sec: ops / secs,
            mb_per_sec: bytes_per_op.map(|b| (b as f64 * ops / 1_000_000.0) / secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    source: String,
    iterations: u32,
    document_bytes: usize,
    elements: usize,
    encode: Timing,
    decode: Timing,
    object_id: Timing,
}

fn print_timing(label: &str, timing: &Timing) {
    println!("\n{}: {:.2} ms total", label, timing.total_ms);
    println!("  Per op:     {:.0} ns", timing.per_op_ns);
    println!("  Ops/sec:    {:.0}", timing.ops_per_sec);
    if let Some(mb) = timing.mb_per_sec {
        println!("  Throughput: {:.2} MB/s", mb);
    }
}

// =============================================================================
// MAIN
// =============================================================================

fn time_iterations<F: FnMut()>(iterations: u32, mut f: F) -> Duration {
    for _ in 0..WARMUP_ITERATIONS.min(iterations) {
        f();
    }
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    start.elapsed()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut json_output = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json_output = true;
        } else {
            positional.push(arg);
        }
    }

    let iterations = positional
        .first()
        .map(|s| s.parse::<u32>().expect("iterations must be a positive integer"))
        .unwrap_or(DEFAULT_ITERATIONS)
        .max(1);

    let (source, doc) = match positional.get(1) {
        Some(path) => (path.clone(), load_json_document(path)),
        None => ("builtin".to_string(), benchmark_document()),
    };
    log::info!("benchmarking {} over {} iterations", source, iterations);

    let encoded = encode_document(&doc).expect("Failed to encode");
    let decoded = decode_document(&encoded).expect("Failed to decode");
    assert_eq!(decoded.len(), doc.len(), "decoded element count differs");

    let encode_time = time_iterations(iterations, || {
        encode_document(&doc).expect("Failed to encode");
    });
    let decode_time = time_iterations(iterations, || {
        decode_document(&encoded).expect("Failed to decode");
    });
    let generator = default_generator();
    let oid_time = time_iterations(iterations, || {
        std::hint::black_box(generator.generate());
    });

    let report = Report {
        source,
        iterations,
        document_bytes: encoded.len(),
        elements: doc.len(),
        encode: Timing::new(encode_time, iterations, Some(encoded.len())),
        decode: Timing::new(decode_time, iterations, Some(encoded.len())),
        object_id: Timing::new(oid_time, iterations, None),
    };

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("Failed to serialize report")
        );
        return;
    }

    println!("Source: {}", report.source);
    println!(
        "Document: {} elements, {} bytes",
        report.elements, report.document_bytes
    );
    println!("Iterations: {}", report.iterations);
    print_timing("Encode", &report.encode);
    print_timing("Decode", &report.decode);
    print_timing("ObjectId generation", &report.object_id);
}
