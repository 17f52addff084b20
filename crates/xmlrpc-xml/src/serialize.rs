//! XML-RPC serialization: converting model types to wire XML.
//!
//! This module provides the [`XmlRpcSerialize`] trait and its implementations
//! for [`Value`], [`MethodCall`] and [`MethodResponse`]. Output follows the
//! XML-RPC conventions:
//!
//! - Integers: decimal under `<int>`
//! - Booleans: `0`/`1` under `<boolean>`
//! - Timestamps: `YYYYMMDDTHH:MM:SS` under `<dateTime.iso8601>`
//! - Binary: standard base64 with padding under `<base64>`
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

use std::io::{self, Write};

use base64::Engine;
use chrono::Datelike;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use xmlrpc_model::{DATETIME_FORMAT, DATETIME_YEARS, MethodCall, MethodResponse, Value};

use crate::error::XmlError;

/// Root element of a request document.
pub const METHOD_CALL: &str = "methodCall";

/// Root element of a response document.
pub const METHOD_RESPONSE: &str = "methodResponse";

/// Trait for serializing XML-RPC types to XML.
///
/// Implementors write their content as child elements inside the current XML
/// context. The root element and declaration are handled by [`to_xml`].
///
/// Uses `io::Result` because `quick_xml::Writer` closures require `io::Result<()>`.
pub trait XmlRpcSerialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete XML-RPC document under `root_element`.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: XmlRpcSerialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Serialize a `methodCall` request document.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn method_call_to_xml(call: &MethodCall) -> Result<Vec<u8>, XmlError> {
    to_xml(METHOD_CALL, call)
}

/// Serialize a `methodResponse` document.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn method_response_to_xml(response: &MethodResponse) -> Result<Vec<u8>, XmlError> {
    to_xml(METHOD_RESPONSE, response)
}

// ---------------------------------------------------------------------------
// Helper functions for writing common XML patterns
// ---------------------------------------------------------------------------

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<param><value>…</value></param>`.
fn write_param<W: Write>(writer: &mut Writer<W>, value: &Value) -> io::Result<()> {
    writer
        .create_element("param")
        .write_inner_content(|w| value.serialize_xml(w))?;
    Ok(())
}

/// Write the single type tag inside a `<value>`.
fn write_typed<W: Write>(writer: &mut Writer<W>, value: &Value) -> io::Result<()> {
    match value {
        Value::Int(i) => write_text_element(writer, "int", &i.to_string()),
        Value::Double(d) => write_text_element(writer, "double", &d.to_string()),
        Value::Boolean(b) => write_text_element(writer, "boolean", if *b { "1" } else { "0" }),
        Value::String(s) => write_text_element(writer, "string", s),
        Value::DateTime(dt) => {
            if !DATETIME_YEARS.contains(&dt.year()) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("dateTime.iso8601 year {} is not representable", dt.year()),
                ));
            }
            write_text_element(
                writer,
                "dateTime.iso8601",
                &dt.format(DATETIME_FORMAT).to_string(),
            )
        }
        Value::Base64(b) => write_text_element(
            writer,
            "base64",
            &base64::engine::general_purpose::STANDARD.encode(b),
        ),
        Value::Array(items) => {
            writer.create_element("array").write_inner_content(|w| {
                w.create_element("data").write_inner_content(|w| {
                    for item in items {
                        item.serialize_xml(w)?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        }
        Value::Struct(members) => {
            writer.create_element("struct").write_inner_content(|w| {
                for (name, member) in members {
                    w.create_element("member").write_inner_content(|w| {
                        write_text_element(w, "name", name)?;
                        member.serialize_xml(w)
                    })?;
                }
                Ok(())
            })?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// XmlRpcSerialize implementations
// ---------------------------------------------------------------------------

impl XmlRpcSerialize for Value {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("value")
            .write_inner_content(|w| write_typed(w, self))?;
        Ok(())
    }
}

impl XmlRpcSerialize for MethodCall {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "methodName", &self.method_name)?;
        writer.create_element("params").write_inner_content(|w| {
            for param in &self.params {
                write_param(w, param)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl XmlRpcSerialize for MethodResponse {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        match self {
            Self::Success(value) => {
                writer
                    .create_element("params")
                    .write_inner_content(|w| write_param(w, value))?;
            }
            Self::Fault(fault) => {
                writer
                    .create_element("fault")
                    .write_inner_content(|w| fault.to_value().serialize_xml(w))?;
            }
        }
        Ok(())
    }
}
