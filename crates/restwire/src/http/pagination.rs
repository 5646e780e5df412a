//! Following `Link` continuations and merging pages
//!
//! A paginated result is either a bare array per page, or an object whose
//! largest array field on the first page is the paginated one. Arrays are
//! concatenated in page order; every other field keeps its first-page value.

use super::Response;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One entry of a `Link` header: `<target>; rel="name"`.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(.*?)>; rel="(.*?)""#).expect("Failed to compile Link header regex")
});

/// Parse a `Link` header into relation name → target.
///
/// The first entry wins when a relation appears twice.
///
/// ```
/// use restwire::http::pagination::parse_link_header;
///
/// let links = parse_link_header(r#"<https://h/items?page=2>; rel="next", <https://h/items?page=9>; rel="last""#);
/// assert_eq!(links["next"], "https://h/items?page=2");
/// assert_eq!(links["last"], "https://h/items?page=9");
/// ```
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();
    for capture in LINK_PATTERN.captures_iter(header) {
        links
            .entry(capture[2].to_string())
            .or_insert_with(|| capture[1].to_string());
    }
    links
}

/// Result of fetching one continuation page.
pub(crate) enum PageFetch {
    /// A successful page
    Page(Response),
    /// The page failed and the error transform produced a replacement for the whole result
    Replaced(Value),
}

/// Assemble the final value starting from a successful first page.
///
/// Continuations are only followed when the first page carries a `Link`
/// header and `max_pages` is at least 2. `fetch` receives the absolute
/// target of each `next` link, strictly one after another.
pub(crate) fn assemble<F>(first: Response, max_pages: usize, mut fetch: F) -> Result<Value>
where
    F: FnMut(&str) -> Result<PageFetch>,
{
    let link = match first.link_header() {
        Some(link) if max_pages >= 2 => link,
        _ => return first.json(),
    };

    let mut pages = vec![first.json()?];
    let mut links = parse_link_header(&link);

    while pages.len() < max_pages
        && let Some(next) = links.remove("next")
    {
        tracing::debug!(url = %next, page = pages.len() + 1, "Following pagination link");

        let response = match fetch(&next)? {
            PageFetch::Page(response) => response,
            PageFetch::Replaced(value) => return Ok(value),
        };

        let link = response.link_header().ok_or_else(|| {
            Error::Protocol(format!(
                "Initial paginated response no longer paginated at {}",
                response.url()
            ))
        })?;
        links = parse_link_header(&link);
        pages.push(response.json()?);
    }

    merge_pages(pages)
}

/// Merge parsed pages into one value.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the pages mix shapes or a later page lacks
/// the paginated array field.
pub fn merge_pages(pages: Vec<Value>) -> Result<Value> {
    let mut rest = pages.into_iter();
    let Some(first) = rest.next() else {
        return Ok(Value::Null);
    };

    match first {
        Value::Array(mut items) => {
            for (index, page) in rest.enumerate() {
                match page {
                    Value::Array(more) => items.extend(more),
                    other => {
                        return Err(Error::Protocol(format!(
                            "page {} is {}, expected an array like the first page",
                            index + 2,
                            shape(&other)
                        )));
                    }
                }
            }
            Ok(Value::Array(items))
        }
        Value::Object(mut fields) => {
            let mut paginated: Option<(String, usize)> = None;
            for (name, value) in &fields {
                if let Value::Array(items) = value
                    && paginated.as_ref().is_none_or(|(_, len)| items.len() > *len)
                {
                    paginated = Some((name.clone(), items.len()));
                }
            }

            let Some((key, _)) = paginated else {
                return Ok(Value::Object(fields));
            };

            let mut items = match fields.get_mut(&key).map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };

            for (index, page) in rest.enumerate() {
                let number = index + 2;
                match page {
                    Value::Object(mut other) => match other.remove(&key) {
                        Some(Value::Array(more)) => items.extend(more),
                        _ => {
                            return Err(Error::Protocol(format!(
                                "page {number} has no array field '{key}'"
                            )));
                        }
                    },
                    other => {
                        return Err(Error::Protocol(format!(
                            "page {number} is {}, expected an object like the first page",
                            shape(&other)
                        )));
                    }
                }
            }

            fields.insert(key, Value::Array(items));
            Ok(Value::Object(fields))
        }
        other => {
            if let Some(page) = rest.next() {
                return Err(Error::Protocol(format!(
                    "cannot merge {} with {}",
                    shape(&other),
                    shape(&page)
                )));
            }
            Ok(other)
        }
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use http::header::{HeaderMap, HeaderValue, LINK};
    use http::StatusCode;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn page(body: Value, next: Option<&str>) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(next) = next {
            headers.insert(
                LINK,
                HeaderValue::from_str(&format!("<{next}>; rel=\"next\"")).unwrap(),
            );
        }
        Response::new(
            StatusCode::OK,
            headers,
            body.to_string(),
            "https://h.example/items".parse().unwrap(),
        )
    }

    fn terminal(body: Value) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static("<https://h.example/items?page=1>; rel=\"first\""),
        );
        Response::new(
            StatusCode::OK,
            headers,
            body.to_string(),
            "https://h.example/items".parse().unwrap(),
        )
    }

    #[test]
    fn test_parse_link_header_ignores_garbage() {
        let links = parse_link_header("garbage, <https://h/a>; rel=\"prev\"");
        assert_eq!(links.len(), 1);
        assert_eq!(links["prev"], "https://h/a");
        assert!(parse_link_header("").is_empty());
    }

    #[rstest]
    #[case(vec![json!([1, 2]), json!([3]), json!([])], json!([1, 2, 3]))]
    #[case(
        vec![json!({"issue": ["A", "B"], "build": "b01"}), json!({"issue": ["C"], "build": "b02"})],
        json!({"issue": ["A", "B", "C"], "build": "b01"})
    )]
    #[case(
        vec![json!({"a": [1], "b": [2, 3], "c": [4, 5]}), json!({"a": [], "b": [6], "c": []})],
        json!({"a": [1], "b": [2, 3, 6], "c": [4, 5]})
    )]
    #[case(vec![json!({"total": 3}), json!({"total": 4})], json!({"total": 3}))]
    #[case(vec![json!("only")], json!("only"))]
    fn test_merge_pages(#[case] pages: Vec<Value>, #[case] expected: Value) {
        assert_eq!(merge_pages(pages).unwrap(), expected);
    }

    #[test]
    fn test_merge_keeps_field_order() {
        let merged = merge_pages(vec![
            json!({"z": 1, "items": [1], "a": 2}),
            json!({"items": [2]}),
        ])
        .unwrap();
        let keys: Vec<&str> = merged.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "items", "a"]);
    }

    #[rstest]
    #[case(vec![json!([1]), json!({"x": [2]})])]
    #[case(vec![json!({"x": [1]}), json!([2])])]
    #[case(vec![json!({"x": [1]}), json!({"y": [2]})])]
    #[case(vec![json!({"x": [1]}), json!({"x": "2"})])]
    #[case(vec![json!(1), json!(2)])]
    fn test_merge_rejects_shape_mismatch(#[case] pages: Vec<Value>) {
        assert_matches!(merge_pages(pages), Err(Error::Protocol(_)));
    }

    #[test]
    fn test_assemble_without_link_returns_single_page() {
        let value = assemble(page(json!([1]), None), usize::MAX, |_| {
            panic!("no continuation expected")
        })
        .unwrap();
        assert_eq!(value, json!([1]));
    }

    #[test]
    fn test_assemble_with_limit_one_ignores_links() {
        let first = page(json!([1]), Some("https://h.example/items?page=2"));
        let value = assemble(first, 1, |_| panic!("no continuation expected")).unwrap();
        assert_eq!(value, json!([1]));
    }

    #[test]
    fn test_assemble_follows_until_limit() {
        let first = page(json!([1]), Some("https://h.example/items?page=2"));
        let mut fetched = Vec::new();
        let value = assemble(first, 2, |url| {
            fetched.push(url.to_string());
            Ok(PageFetch::Page(page(
                json!([2]),
                Some("https://h.example/items?page=3"),
            )))
        })
        .unwrap();

        assert_eq!(value, json!([1, 2]));
        assert_eq!(fetched, ["https://h.example/items?page=2"]);
    }

    #[test]
    fn test_assemble_stops_without_next() {
        let first = page(json!([1]), Some("https://h.example/items?page=2"));
        let value = assemble(first, usize::MAX, |_| Ok(PageFetch::Page(terminal(json!([2])))))
            .unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_assemble_fails_when_pagination_disappears() {
        let first = page(json!([1]), Some("https://h.example/items?page=2"));
        let result = assemble(first, usize::MAX, |_| Ok(PageFetch::Page(page(json!([2]), None))));
        assert_matches!(result, Err(Error::Protocol(msg)) if msg.contains("no longer paginated"));
    }

    #[test]
    fn test_assemble_replacement_discards_pages() {
        let first = page(json!([1]), Some("https://h.example/items?page=2"));
        let value = assemble(first, usize::MAX, |_| {
            Ok(PageFetch::Replaced(json!({"recovered": true})))
        })
        .unwrap();
        assert_eq!(value, json!({"recovered": true}));
    }

    proptest! {
        #[test]
        fn prop_split_then_merge_is_identity(
            items in proptest::collection::vec(any::<i64>(), 0..40),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..5),
        ) {
            let mut bounds: Vec<usize> = cuts.iter().map(|c| c.index(items.len() + 1)).collect();
            bounds.push(0);
            bounds.push(items.len());
            bounds.sort_unstable();

            let pages: Vec<Value> = bounds
                .windows(2)
                .map(|w| json!({"meta": "m", "values": items[w[0]..w[1]].to_vec()}))
                .collect();
            let arrays: Vec<Value> = bounds
                .windows(2)
                .map(|w| json!(items[w[0]..w[1]].to_vec()))
                .collect();

            prop_assert_eq!(merge_pages(arrays).unwrap(), json!(items.clone()));

            prop_assert_eq!(
                merge_pages(pages).unwrap(),
                json!({"meta": "m", "values": items})
            );
        }
    }
}
