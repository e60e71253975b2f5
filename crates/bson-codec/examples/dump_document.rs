//! Prints the element tree of an encoded document file.
//!
//! Usage: `cargo run --example dump_document -- <file> [--strict]`

use std::fs;

use bson_codec::{decode_with_options, DecodeOptions, Value};

fn preview(s: &str) -> String {
    let head: String = s.chars().take(60).collect();
    if s.chars().count() > 60 {
        format!("\"{}...\"", head)
    } else {
        format!("\"{}\"", head)
    }
}

fn print_value(key: &str, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Document(doc) => {
            match value.as_db_ref() {
                Some(r) => println!("{}{}: DBREF({}) {{", pad, key, r.collection),
                None => println!("{}{}: {{", pad, key),
            }
            for (k, v) in doc {
                print_value(k, v, indent + 1);
            }
            println!("{}}}", pad);
        }
        Value::Array(items) => {
            println!("{}{}: [", pad, key);
            for (i, v) in items.iter().enumerate() {
                print_value(&i.to_string(), v, indent + 1);
            }
            println!("{}]", pad);
        }
        Value::CodeWithScope(cws) => {
            println!("{}{}: CODE({}) scope {{", pad, key, preview(&cws.code));
            for (k, v) in &cws.scope {
                print_value(k, v, indent + 1);
            }
            println!("{}}}", pad);
        }
        Value::Double(f) => println!("{}{}: {}", pad, key, f),
        Value::String(s) => println!("{}{}: {}", pad, key, preview(s)),
        Value::Binary(b) => println!(
            "{}{}: BINARY({:?}, {} bytes)",
            pad,
            key,
            b.subtype,
            b.bytes.len()
        ),
        Value::Undefined => println!("{}{}: undefined", pad, key),
        Value::ObjectId(id) => println!("{}{}: ObjectId({})", pad, key, id),
        Value::Boolean(b) => println!("{}{}: {}", pad, key, b),
        Value::DateTime(ms) => println!("{}{}: DATE({})", pad, key, ms),
        Value::Null => println!("{}{}: null", pad, key),
        Value::Regex(r) => println!("{}{}: /{}/{}", pad, key, r.pattern, r.flags),
        Value::DbPointer(p) => println!("{}{}: DBPOINTER({}, {})", pad, key, p.namespace, p.id),
        Value::Code(c) => println!("{}{}: CODE({})", pad, key, preview(c)),
        Value::Symbol(s) => println!("{}{}: SYMBOL({})", pad, key, preview(s)),
        Value::Int32(n) => println!("{}{}: {}", pad, key, n),
        Value::Timestamp(t) => println!(
            "{}{}: TIMESTAMP(inc={}, s={})",
            pad, key, t.increment, t.seconds
        ),
        Value::Int64(n) => println!("{}{}: {}L", pad, key, n),
        Value::MinKey => println!("{}{}: MinKey", pad, key),
        Value::MaxKey => println!("{}{}: MaxKey", pad, key),
        Value::Custom(c) => println!("{}{}: {:?}", pad, key, c),
    }
}

fn main() {
    env_logger::init();

    let mut strict = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--strict" {
            strict = true;
        } else {
            path = Some(arg);
        }
    }
    let path = path.expect("usage: dump_document <file> [--strict]");

    let data = fs::read(&path).expect("Failed to read file");
    println!("Reading: {} ({} bytes)", path, data.len());

    let options = if strict {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    };
    match decode_with_options(&data, options) {
        Ok(value) => print_value("<root>", &value, 0),
        Err(e) => {
            eprintln!("{} ({})", e, e.kind().name());
            std::process::exit(1);
        }
    }
}
