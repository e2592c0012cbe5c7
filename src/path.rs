//! Structural paths into JSON documents
//!
//! A path is a dot separated list of keys. A segment in brackets with an
//! `=` selects the first element of an array whose property matches:
//!
//! ```text
//! people[name="bob"].age
//! rows[id=3].cells.0
//! ```

use serde_json::{Map, Value};

use crate::error::{StreamError, StreamResult};

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Text(String),
    Number(f64),
}

impl Selector {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Selector::Text(s), Value::String(v)) => s == v,
            (Selector::Number(n), Value::Number(v)) => v.as_f64() == Some(*n),
            _ => false,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Selector::Text(s) => Value::String(s.clone()),
            Selector::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Select { key: String, selector: Selector },
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn invalid(path: &str) -> StreamError {
    StreamError::InvalidPath(path.to_string())
}

fn parse(path: &str) -> StreamResult<Vec<Segment>> {
    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    let word = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_word(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        let bracket = chars[i] == '[';
        if bracket {
            i += 1;
        }

        let key = word(&mut i);
        if key.is_empty() {
            return Err(invalid(path));
        }

        let mut selector = None;
        if chars.get(i) == Some(&'=') {
            i += 1;
            let quote = match chars.get(i) {
                Some(&q) if q == '"' || q == '\'' => {
                    i += 1;
                    Some(q)
                }
                _ => None,
            };
            let raw = word(&mut i);
            if raw.is_empty() {
                return Err(invalid(path));
            }
            selector = Some(match quote {
                Some(q) => {
                    if chars.get(i) != Some(&q) {
                        return Err(invalid(path));
                    }
                    i += 1;
                    Selector::Text(raw)
                }
                None => raw
                    .parse::<f64>()
                    .map(Selector::Number)
                    .unwrap_or(Selector::Text(raw)),
            });
        }

        if bracket {
            if chars.get(i) != Some(&']') {
                return Err(invalid(path));
            }
            i += 1;
        }

        segments.push(match selector {
            Some(selector) => Segment::Select { key, selector },
            None => Segment::Key(key),
        });

        match chars.get(i) {
            None => break,
            Some('.') if i + 1 < chars.len() => i += 1,
            Some('[') => {}
            Some(_) => return Err(invalid(path)),
        }
    }

    Ok(segments)
}

fn index(key: &str, path: &str) -> StreamResult<usize> {
    key.parse::<usize>().map_err(|_| invalid(path))
}

fn find(items: &[Value], key: &str, selector: &Selector) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get(key).map_or(false, |v| selector.matches(v)))
}

/// Read the value at `path`. A path that runs through a missing key or a
/// scalar yields `Ok(None)`; only malformed syntax is an error.
pub fn get_path<'a>(path: &str, object: &'a Value) -> StreamResult<Option<&'a Value>> {
    let segments = parse(path)?;
    let mut current = object;

    for segment in &segments {
        let next = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|n| items.get(n))
            }
            (Segment::Select { key, selector }, Value::Array(items)) => {
                find(items, key, selector).map(|n| &items[n])
            }
            _ => None,
        };

        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

/// Write `value` at `path`, creating intermediate objects as needed. A
/// selector that matches nothing appends a new element carrying the selected
/// property. The final segment must be a plain key.
pub fn set_path(path: &str, object: &mut Value, value: Value) -> StreamResult<()> {
    let segments = parse(path)?;
    let (last, init) = match segments.split_last() {
        Some((Segment::Key(last), init)) => (last, init),
        _ => return Err(invalid(path)),
    };

    let mut current = object;

    for segment in init {
        current = match segment {
            Segment::Key(key) => {
                let slot = match current {
                    Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                    Value::Array(items) => {
                        let n = index(key, path)?;
                        items.get_mut(n).ok_or_else(|| invalid(path))?
                    }
                    _ => return Err(invalid(path)),
                };
                if !(slot.is_object() || slot.is_array()) {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
            Segment::Select { key, selector } => {
                let items = match current {
                    Value::Array(items) => items,
                    _ => return Err(invalid(path)),
                };
                let n = match find(items, key, selector) {
                    Some(n) => n,
                    None => {
                        let mut entry = Map::new();
                        entry.insert(key.clone(), selector.to_value());
                        items.push(Value::Object(entry));
                        items.len() - 1
                    }
                };
                &mut items[n]
            }
        };
    }

    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let n = index(last, path)?;
            if n < items.len() {
                items[n] = value;
            } else if n == items.len() {
                items.push(value);
            } else {
                return Err(invalid(path));
            }
            Ok(())
        }
        _ => Err(invalid(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_selectors() {
        let segments = parse("a.b[id=3].c").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Select { key: "id".into(), selector: Selector::Number(3.0) },
                Segment::Key("c".into()),
            ]
        );
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        assert!(parse("a[id=3").is_err());
        assert!(parse("a[name=\"x]").is_err());
        assert!(parse("a..b").is_err());
        assert!(parse("a.").is_err());
    }
}
