//! Resource: data://random_data. Random printable ASCII text.

use url::Url;

use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

pub const URI: &str = "data://random_data";

const HOST: &str = "random_data";

/// Whether `uri` addresses this resource.
pub fn matches(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(url) => url.scheme() == "data" && url.host_str() == Some(HOST),
        Err(_) => false,
    }
}

/// Parse the required `length` query parameter.
fn requested_length(url: &Url) -> McpResult<usize> {
    let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "length") else {
        return Err(McpError::InvalidParams(
            "missing 'length' query parameter".to_string(),
        ));
    };
    let parsed: i64 = value
        .parse()
        .map_err(|_| McpError::InvalidParams(format!("length must be an integer, got '{value}'")))?;
    if parsed <= 0 {
        return Err(mcp_content::ContentError::LengthNotPositive.into());
    }
    Ok(usize::try_from(parsed).unwrap_or(usize::MAX))
}

pub async fn read_random_data(uri: &str) -> McpResult<ReadResourceResult> {
    let url = Url::parse(uri).map_err(|e| McpError::InvalidParams(format!("{uri}: {e}")))?;
    let length = requested_length(&url)?;
    let text = mcp_content::random_data(length)?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::text(uri, "text/plain", text)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_only_random_data() {
        assert!(matches("data://random_data"));
        assert!(matches("data://random_data?length=5"));
        assert!(!matches("data://other"));
        assert!(!matches("file:///tmp/x"));
        assert!(!matches("not a uri"));
    }

    #[tokio::test]
    async fn test_length_parameter() {
        let result = read_random_data("data://random_data?length=37").await.unwrap();
        let text = result.contents[0].text.as_deref().unwrap();
        assert_eq!(text.len(), 37);
        assert!(text.bytes().all(|b| (b' '..=b'~').contains(&b)));
    }

    #[tokio::test]
    async fn test_missing_and_bad_lengths() {
        for uri in [
            URI,
            "data://random_data?size=4",
            "data://random_data?length=0",
            "data://random_data?length=abc",
            "data://random_data?length=999999",
        ] {
            let err = read_random_data(uri).await.unwrap_err();
            assert!(matches!(err, McpError::InvalidParams(_)), "{uri}");
        }
    }
}
