//! Post-bind transforms.
//!
//! Every transform reads the field through [`Slot::to_value`], rewrites the
//! value and writes it back with [`Slot::assign`], so it works on any field
//! type whose value has the expected shape. Absent values (`None` fields)
//! are left alone.

use std::cmp::Ordering;

use gleaner::{BoxError, Slot, Transform, Value};

use crate::error::ExtractError;

/// Removes surrounding whitespace from text and sequences of text.
///
/// Annotation: empty or `both`, `start`, `end`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl Transform for Trim {
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        let trim: fn(&str) -> &str = match annotation.trim() {
            "" | "both" => str::trim,
            "start" => str::trim_start,
            "end" => str::trim_end,
            other => return Err(ExtractError::annotation("trim", other).into()),
        };
        rewrite_text("trim", slot, |text| trim(text).to_string())
    }
}

/// Changes the letter case of text and sequences of text.
///
/// Annotation: `lower`, `upper` or `title`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Case;

impl Transform for Case {
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        let convert: fn(&str) -> String = match annotation.trim() {
            "lower" => str::to_lowercase,
            "upper" => str::to_uppercase,
            "title" => title_case,
            other => return Err(ExtractError::annotation("case", other).into()),
        };
        rewrite_text("case", slot, convert)
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn rewrite_text<F>(transform: &'static str, slot: &mut dyn Slot, f: F) -> Result<(), BoxError>
where
    F: Fn(&str) -> String,
{
    let rewritten = match slot.to_value() {
        Value::Null => return Ok(()),
        Value::Text(text) => Value::Text(f(&text)),
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Text(text) => Ok(Value::Text(f(&text))),
                    other => Err(ExtractError::UnsupportedValue {
                        transform,
                        found: other.kind(),
                    }),
                })
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(ExtractError::UnsupportedValue {
                transform,
                found: other.kind(),
            }
            .into())
        }
    };
    slot.assign(rewritten).map_err(ExtractError::from)?;
    Ok(())
}

/// Limits a number to a range.
///
/// Annotation: `"min,max"`; either bound may be left empty. A value outside
/// the range is replaced by the bound, coerced into the field's type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clamp;

impl Transform for Clamp {
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        let (min, max) = parse_bounds(annotation)?;
        let current = match slot.to_value() {
            Value::Null => return Ok(()),
            value => number(&value).ok_or(ExtractError::UnsupportedValue {
                transform: "clamp",
                found: value.kind(),
            })?,
        };

        let bound = match (min, max) {
            (Some((low, text)), _) if current < low => text,
            (_, Some((high, text))) if current > high => text,
            _ => return Ok(()),
        };
        slot.assign(Value::from(bound)).map_err(ExtractError::from)?;
        Ok(())
    }
}

type Bound<'a> = Option<(f64, &'a str)>;

fn parse_bounds(annotation: &str) -> Result<(Bound<'_>, Bound<'_>), ExtractError> {
    let (min, max) = annotation
        .split_once(',')
        .ok_or_else(|| ExtractError::annotation("clamp", annotation))?;
    let (min, max) = (parse_bound(min, annotation)?, parse_bound(max, annotation)?);
    if let (Some((low, _)), Some((high, _))) = (min, max) {
        if low > high {
            return Err(ExtractError::annotation("clamp", annotation));
        }
    }
    Ok((min, max))
}

fn parse_bound<'a>(text: &'a str, annotation: &str) -> Result<Bound<'a>, ExtractError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let n = text
        .parse::<f64>()
        .map_err(|_| ExtractError::annotation("clamp", annotation))?;
    Ok(Some((n, text)))
}

#[allow(clippy::cast_precision_loss)]
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Uint(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Removes repeated elements from a sequence, keeping first occurrences.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dedup;

impl Transform for Dedup {
    fn apply(&self, _annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        let items = match slot.to_value() {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            _ => {
                return Err(ExtractError::UnsupportedField {
                    transform: "dedup",
                    kind: slot.kind(),
                }
                .into())
            }
        };
        let before = items.len();
        let mut unique: Vec<Value> = Vec::with_capacity(before);
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        if unique.len() != before {
            slot.assign(Value::List(unique)).map_err(ExtractError::from)?;
        }
        Ok(())
    }
}

/// Sorts a sequence of numbers or of text.
///
/// Annotation: empty or `asc`, `desc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sort;

impl Transform for Sort {
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        let descending = match annotation.trim() {
            "" | "asc" => false,
            "desc" => true,
            other => return Err(ExtractError::annotation("sort", other).into()),
        };
        let mut items = match slot.to_value() {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            _ => {
                return Err(ExtractError::UnsupportedField {
                    transform: "sort",
                    kind: slot.kind(),
                }
                .into())
            }
        };

        if items.iter().all(|v| number(v).is_some()) {
            items.sort_by(compare_numbers);
        } else if items.iter().all(|v| v.as_text().is_some()) {
            items.sort_by(|a, b| a.as_text().cmp(&b.as_text()));
        } else {
            return Err(ExtractError::UnsupportedValue {
                transform: "sort",
                found: "mixed sequence",
            }
            .into());
        }
        if descending {
            items.reverse();
        }
        slot.assign(Value::List(items)).map_err(ExtractError::from)?;
        Ok(())
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (number(a), number(b)) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_trim_modes() {
        let mut name = String::from("  ada  ");
        Trim.apply("start", &mut name).unwrap();
        assert_eq!(name, "ada  ");

        Trim.apply("", &mut name).unwrap();
        assert_eq!(name, "ada");
    }

    #[test]
    fn test_trim_sequence() {
        let mut tags = strings(&[" a", "b "]);
        Trim.apply("both", &mut tags).unwrap();
        assert_eq!(tags, strings(&["a", "b"]));
    }

    #[test]
    fn test_trim_rejects_numbers() {
        let mut n: i32 = 3;
        let err = Trim.apply("", &mut n).unwrap_err();
        assert_eq!(err.to_string(), "transform `trim` cannot be applied to integer");
    }

    #[test]
    fn test_case() {
        let mut name = String::from("ada LOVELACE");
        Case.apply("title", &mut name).unwrap();
        assert_eq!(name, "Ada Lovelace");

        Case.apply("upper", &mut name).unwrap();
        assert_eq!(name, "ADA LOVELACE");
    }

    #[test]
    fn test_case_requires_mode() {
        let mut name = String::from("x");
        let err = Case.apply("", &mut name).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::InvalidAnnotation { transform: "case", .. })
        ));
    }

    #[test]
    fn test_none_is_left_alone() {
        let mut nick: Option<String> = None;
        Case.apply("lower", &mut nick).unwrap();
        Clamp.apply("1,5", &mut nick).unwrap();
        assert_eq!(nick, None);
    }

    #[test]
    fn test_clamp() {
        let mut page: u32 = 0;
        Clamp.apply("1,100", &mut page).unwrap();
        assert_eq!(page, 1);

        page = 500;
        Clamp.apply("1,100", &mut page).unwrap();
        assert_eq!(page, 100);

        page = 42;
        Clamp.apply("1,100", &mut page).unwrap();
        assert_eq!(page, 42);
    }

    #[test]
    fn test_clamp_open_bounds() {
        let mut ratio: f64 = -2.5;
        Clamp.apply("0,", &mut ratio).unwrap();
        assert_eq!(ratio, 0.0);

        let mut limit: i64 = 9000;
        Clamp.apply(",50", &mut limit).unwrap();
        assert_eq!(limit, 50);
    }

    #[test]
    fn test_clamp_invalid_annotation() {
        let mut n: i32 = 0;
        assert!(Clamp.apply("10", &mut n).is_err());
        assert!(Clamp.apply("a,b", &mut n).is_err());
        assert!(Clamp.apply("5,1", &mut n).is_err());
    }

    #[test]
    fn test_clamp_fractional_bound_into_integer() {
        let mut n: i32 = 0;
        let err = Clamp.apply("1.5,", &mut n).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::Coercion(_))
        ));
    }

    #[test]
    fn test_dedup() {
        let mut ids: Vec<u32> = vec![3, 1, 3, 2, 1];
        Dedup.apply("", &mut ids).unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_dedup_rejects_scalar() {
        let mut name = String::from("a");
        let err = Dedup.apply("", &mut name).unwrap_err();
        assert_eq!(err.to_string(), "transform `dedup` cannot be applied to a text field");
    }

    #[test]
    fn test_sort() {
        let mut ids: Vec<i32> = vec![10, -2, 7];
        Sort.apply("", &mut ids).unwrap();
        assert_eq!(ids, vec![-2, 7, 10]);

        let mut names = strings(&["b", "c", "a"]);
        Sort.apply("desc", &mut names).unwrap();
        assert_eq!(names, strings(&["c", "b", "a"]));
    }

    #[test]
    fn test_sort_numbers_not_lexically() {
        let mut ids: Vec<u64> = vec![10, 9, 100];
        Sort.apply("asc", &mut ids).unwrap();
        assert_eq!(ids, vec![9, 10, 100]);
    }

    #[test]
    fn test_sort_bad_direction() {
        let mut ids: Vec<u8> = vec![1];
        assert!(Sort.apply("random", &mut ids).is_err());
    }
}
