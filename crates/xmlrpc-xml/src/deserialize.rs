//! XML-RPC deserialization: strict decoding of wire XML into model types.
//!
//! Decoding happens in two passes. The document is first read with quick-xml
//! into a small generic tree of [`Element`]s, which takes care of
//! well-formedness, entity resolution and CDATA. The tree is then walked by a
//! recursive-descent decoder with one function per node shape (response,
//! params, value, array, struct member, fault). Every grammar violation is
//! reported as an [`XmlError`]; nothing is recovered or partially returned.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use base64::Engine;
use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::Event;
use xmlrpc_model::{
    DATETIME_FORMAT, FAULT_CODE, FAULT_STRING, Fault, MethodCall, MethodResponse, Value,
};

use crate::error::XmlError;
use crate::serialize::{METHOD_CALL, METHOD_RESPONSE};

/// Maximum element nesting depth accepted by the decoder.
///
/// The tree walk recurses once per element level, so deeper documents are
/// rejected while the tree is built.
pub const MAX_DEPTH: usize = 512;

/// Decode a `methodResponse` document.
///
/// # Errors
///
/// Returns `XmlError` if the document is not well-formed XML or violates the
/// XML-RPC response grammar, including a `fault` whose struct does not carry
/// exactly `faultCode` and `faultString`.
pub fn from_method_response(xml: &[u8]) -> Result<MethodResponse, XmlError> {
    let root = parse_document(xml)?;
    expect_name(&root, METHOD_RESPONSE)?;

    let body = only_child(&root)?;
    let response = match body.name.as_str() {
        "params" => {
            let param = only_child_named(body, "param")?;
            let value = only_child_named(param, "value")?;
            MethodResponse::Success(decode_value(value)?)
        }
        "fault" => MethodResponse::Fault(decode_fault(body)?),
        other => {
            return Err(XmlError::UnexpectedElement(format!(
                "<{other}> inside <{METHOD_RESPONSE}>"
            )));
        }
    };

    tracing::trace!(fault = response.is_fault(), "decoded XML-RPC response");
    Ok(response)
}

/// Decode a `methodCall` document.
///
/// `<params>` may be omitted, in which case the call has no parameters.
///
/// # Errors
///
/// Returns `XmlError` if the document is not well-formed XML or violates the
/// XML-RPC request grammar.
pub fn from_method_call(xml: &[u8]) -> Result<MethodCall, XmlError> {
    let root = parse_document(xml)?;
    expect_name(&root, METHOD_CALL)?;
    reject_mixed_text(&root)?;

    let mut method_name = None;
    let mut params = None;

    for child in &root.children {
        match child.name.as_str() {
            "methodName" => {
                if method_name.replace(leaf_text(child)?.to_owned()).is_some() {
                    return Err(XmlError::UnexpectedElement(
                        "more than one <methodName>".to_owned(),
                    ));
                }
            }
            "params" => {
                if params.replace(decode_params(child)?).is_some() {
                    return Err(XmlError::UnexpectedElement(
                        "more than one <params>".to_owned(),
                    ));
                }
            }
            other => {
                return Err(XmlError::UnexpectedElement(format!(
                    "<{other}> inside <{METHOD_CALL}>"
                )));
            }
        }
    }

    let method_name =
        method_name.ok_or_else(|| XmlError::MissingElement("methodName".to_owned()))?;
    Ok(MethodCall::new(method_name, params.unwrap_or_default()))
}

// ---------------------------------------------------------------------------
// Generic element tree
// ---------------------------------------------------------------------------

/// A parsed XML element: its name, its accumulated character data and its
/// child elements. Attributes carry no meaning in XML-RPC and are dropped.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Read a whole document into a single root [`Element`].
fn parse_document(xml: &[u8]) -> Result<Element, XmlError> {
    let mut reader = Reader::from_reader(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::UnexpectedElement(
                        "more than one root element".to_owned(),
                    ));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::NestingTooDeep(MAX_DEPTH));
                }
                stack.push(Element::new(element_name(e.name().as_ref())?));
            }
            Event::Empty(e) => {
                let element = Element::new(element_name(e.name().as_ref())?);
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::UnexpectedElement("end tag without start tag".to_owned())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                push_text(&mut stack, &unescaped)?;
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                push_text(&mut stack, text)?;
            }
            Event::GeneralRef(e) => {
                let resolved = match e
                    .resolve_char_ref()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?
                {
                    Some(ch) => ch.to_string(),
                    None => {
                        let name = e
                            .decode()
                            .map_err(|err| XmlError::ParseError(err.to_string()))?;
                        quick_xml::escape::resolve_predefined_entity(&name)
                            .ok_or_else(|| {
                                XmlError::ParseError(format!("unknown entity &{name};"))
                            })?
                            .to_owned()
                    }
                };
                push_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::MissingElement(format!(
            "closing tag for <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| XmlError::MissingElement("root element".to_owned()))
}

fn element_name(raw: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(raw)
        .map(ToOwned::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Attach a completed element to its parent, or make it the root.
fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(XmlError::UnexpectedElement(
                "more than one root element".to_owned(),
            ));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(XmlError::UnexpectedElement(format!(
                "text outside the root element: {text:?}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shape checks
// ---------------------------------------------------------------------------

fn expect_name(element: &Element, expected: &str) -> Result<(), XmlError> {
    if element.name == expected {
        Ok(())
    } else {
        Err(XmlError::UnexpectedElement(format!(
            "expected <{expected}>, found <{}>",
            element.name
        )))
    }
}

/// Character data may only appear in elements without child elements.
fn reject_mixed_text(element: &Element) -> Result<(), XmlError> {
    if !element.children.is_empty() && element.has_text() {
        return Err(XmlError::UnexpectedElement(format!(
            "text mixed with child elements in <{}>",
            element.name
        )));
    }
    Ok(())
}

fn only_child(element: &Element) -> Result<&Element, XmlError> {
    reject_mixed_text(element)?;
    match element.children.as_slice() {
        [child] => Ok(child),
        [] => Err(XmlError::MissingElement(format!(
            "child element of <{}>",
            element.name
        ))),
        children => Err(XmlError::UnexpectedElement(format!(
            "<{}> must have exactly one child element, found {}",
            element.name,
            children.len()
        ))),
    }
}

fn only_child_named<'a>(element: &'a Element, name: &str) -> Result<&'a Element, XmlError> {
    let child = only_child(element)?;
    expect_name(child, name)?;
    Ok(child)
}

/// Text of an element that must not contain child elements.
fn leaf_text(element: &Element) -> Result<&str, XmlError> {
    match element.children.first() {
        Some(child) => Err(XmlError::UnexpectedElement(format!(
            "<{}> inside <{}>",
            child.name, element.name
        ))),
        None => Ok(&element.text),
    }
}

// ---------------------------------------------------------------------------
// Node decoders
// ---------------------------------------------------------------------------

fn decode_params(element: &Element) -> Result<Vec<Value>, XmlError> {
    reject_mixed_text(element)?;
    element
        .children
        .iter()
        .map(|param| {
            expect_name(param, "param")?;
            decode_value(only_child_named(param, "value")?)
        })
        .collect()
}

fn decode_value(element: &Element) -> Result<Value, XmlError> {
    expect_name(element, "value")?;
    reject_mixed_text(element)?;

    match element.children.as_slice() {
        [] => Ok(Value::String(element.text.clone())),
        [typed] => decode_typed(typed),
        children => Err(XmlError::UnexpectedElement(format!(
            "<value> must have at most one type element, found {}",
            children.len()
        ))),
    }
}

fn decode_typed(element: &Element) -> Result<Value, XmlError> {
    match element.name.as_str() {
        "int" | "i4" => parse_i32(leaf_text(element)?).map(Value::Int),
        "double" => parse_f64(leaf_text(element)?).map(Value::Double),
        "boolean" => parse_bool(leaf_text(element)?).map(Value::Boolean),
        "string" => Ok(Value::String(leaf_text(element)?.to_owned())),
        "dateTime.iso8601" => parse_datetime(leaf_text(element)?).map(Value::DateTime),
        "base64" => parse_base64(leaf_text(element)?).map(Value::Base64),
        "array" => decode_array(element).map(Value::Array),
        "struct" => decode_struct(element).map(Value::Struct),
        other => Err(XmlError::UnexpectedElement(format!(
            "unknown value type <{other}>"
        ))),
    }
}

fn decode_array(element: &Element) -> Result<Vec<Value>, XmlError> {
    let data = only_child_named(element, "data")?;
    reject_mixed_text(data)?;
    data.children.iter().map(decode_value).collect()
}

fn decode_struct(element: &Element) -> Result<BTreeMap<String, Value>, XmlError> {
    reject_mixed_text(element)?;

    let mut members = BTreeMap::new();
    for member in &element.children {
        let (name, value) = decode_member(member)?;
        match members.entry(name) {
            Entry::Occupied(e) => {
                return Err(XmlError::UnexpectedElement(format!(
                    "duplicate struct member {:?}",
                    e.key()
                )));
            }
            Entry::Vacant(e) => {
                e.insert(value);
            }
        }
    }
    Ok(members)
}

/// A `<member>` holds exactly one `<name>` and one `<value>`, in either order.
fn decode_member(element: &Element) -> Result<(String, Value), XmlError> {
    expect_name(element, "member")?;
    reject_mixed_text(element)?;

    let mut name = None;
    let mut value = None;

    for child in &element.children {
        match child.name.as_str() {
            "name" => {
                if name.replace(leaf_text(child)?.to_owned()).is_some() {
                    return Err(XmlError::UnexpectedElement(
                        "struct member with more than one <name>".to_owned(),
                    ));
                }
            }
            "value" => {
                if value.replace(decode_value(child)?).is_some() {
                    return Err(XmlError::UnexpectedElement(
                        "struct member with more than one <value>".to_owned(),
                    ));
                }
            }
            other => {
                return Err(XmlError::UnexpectedElement(format!(
                    "<{other}> inside <member>"
                )));
            }
        }
    }

    let name =
        name.ok_or_else(|| XmlError::MissingElement("<name> in struct member".to_owned()))?;
    let value = value
        .ok_or_else(|| XmlError::MissingElement(format!("<value> in struct member {name:?}")))?;
    Ok((name, value))
}

fn decode_fault(element: &Element) -> Result<Fault, XmlError> {
    let value = decode_value(only_child_named(element, "value")?)?;
    let Value::Struct(members) = value else {
        return Err(XmlError::InvalidFault(format!(
            "fault value must be a struct, found {}",
            value.type_name()
        )));
    };

    if let Some(extra) = members
        .keys()
        .find(|k| k.as_str() != FAULT_CODE && k.as_str() != FAULT_STRING)
    {
        return Err(XmlError::InvalidFault(format!(
            "unexpected member {extra:?}"
        )));
    }

    let code = match members.get(FAULT_CODE) {
        Some(Value::Int(code)) => *code,
        Some(other) => {
            return Err(XmlError::InvalidFault(format!(
                "{FAULT_CODE} must be an int, found {}",
                other.type_name()
            )));
        }
        None => return Err(XmlError::InvalidFault(format!("missing {FAULT_CODE}"))),
    };

    let message = match members.get(FAULT_STRING) {
        Some(Value::String(message)) => message.clone(),
        Some(other) => {
            return Err(XmlError::InvalidFault(format!(
                "{FAULT_STRING} must be a string, found {}",
                other.type_name()
            )));
        }
        None => return Err(XmlError::InvalidFault(format!("missing {FAULT_STRING}"))),
    };

    Ok(Fault { code, message })
}

// ---------------------------------------------------------------------------
// Scalar parsers
// ---------------------------------------------------------------------------

fn parse_i32(s: &str) -> Result<i32, XmlError> {
    let s = s.trim();
    s.parse::<i32>()
        .map_err(|e| XmlError::ParseError(format!("invalid int '{s}': {e}")))
}

fn parse_f64(s: &str) -> Result<f64, XmlError> {
    let s = s.trim();
    match s.parse::<f64>() {
        Ok(d) if d.is_finite() => Ok(d),
        Ok(_) => Err(XmlError::ParseError(format!("non-finite double '{s}'"))),
        Err(e) => Err(XmlError::ParseError(format!("invalid double '{s}': {e}"))),
    }
}

fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(XmlError::ParseError(format!("invalid boolean: {other}"))),
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, XmlError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| XmlError::ParseError(format!("invalid dateTime.iso8601 '{s}': {e}")))
}

/// Decode base64 text; line breaks and other whitespace are ignored.
fn parse_base64(s: &str) -> Result<bytes::Bytes, XmlError> {
    let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map(bytes::Bytes::from)
        .map_err(|e| XmlError::ParseError(format!("invalid base64: {e}")))
}
