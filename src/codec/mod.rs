//! Manifest codecs: two interchangeable serializations of the annotated
//! tree. Both reproduce the exact same in-memory tree on decode.

pub mod xml;
pub mod yaml;

use crate::error::ManifestError;
use crate::tree::node::FolderNode;
use crate::types::{Algorithm, DigestMap, Format};

pub use xml::XmlCodec;
pub use yaml::YamlCodec;

/// Encoder/decoder between the annotated tree and a serialized byte stream.
pub trait ManifestCodec {
    fn encode(&self, tree: &FolderNode) -> Result<Vec<u8>, ManifestError>;
    fn decode(&self, bytes: &[u8]) -> Result<FolderNode, ManifestError>;
}

/// Codec for the given format.
pub fn codec_for(format: Format) -> Box<dyn ManifestCodec> {
    match format {
        Format::Xml => Box::new(XmlCodec),
        Format::Yaml => Box::new(YamlCodec),
    }
}

/// Render a digest map as space-separated `algorithm:hexdigest` tokens.
pub(crate) fn format_hash_tokens(digests: &DigestMap) -> String {
    digests
        .iter()
        .map(|(algorithm, value)| format!("{}:{}", algorithm, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse space-separated `algorithm:hexdigest` tokens.
///
/// A token without a colon, with an empty side, with an unknown algorithm
/// or with non-lowercase-hex digits aborts the decode.
pub(crate) fn parse_hash_tokens(s: &str) -> Result<DigestMap, ManifestError> {
    let mut digests = DigestMap::new();
    for token in s.split(' ').filter(|t| !t.is_empty()) {
        let (name, value) = token.split_once(':').ok_or_else(|| {
            ManifestError::MalformedHashToken {
                token: token.to_string(),
            }
        })?;
        if name.is_empty() || value.is_empty() {
            return Err(ManifestError::MalformedHashToken {
                token: token.to_string(),
            });
        }
        let algorithm: Algorithm = name.parse()?;
        check_hex(value, token)?;
        digests.insert(algorithm, value.to_string());
    }
    Ok(digests)
}

/// Digest values are lowercase hex by contract.
pub(crate) fn check_hex(value: &str, context: &str) -> Result<(), ManifestError> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if ok {
        Ok(())
    } else {
        Err(ManifestError::MalformedHashToken {
            token: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let mut digests = DigestMap::new();
        digests.insert(Algorithm::Sha1, "aa".to_string());
        digests.insert(Algorithm::GitSha1, "bb".to_string());
        let rendered = format_hash_tokens(&digests);
        assert_eq!(rendered, "sha1:aa git-sha1:bb");
        assert_eq!(parse_hash_tokens(&rendered).unwrap(), digests);
    }

    #[test]
    fn test_token_without_colon_rejected() {
        let err = parse_hash_tokens("sha1-deadbeef").unwrap_err();
        assert!(matches!(err, ManifestError::MalformedHashToken { .. }));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = parse_hash_tokens("md5:deadbeef").unwrap_err();
        assert!(matches!(err, ManifestError::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_uppercase_hex_rejected() {
        assert!(parse_hash_tokens("sha1:DEADBEEF").is_err());
    }

    #[test]
    fn test_empty_sides_rejected() {
        assert!(parse_hash_tokens(":deadbeef").is_err());
        assert!(parse_hash_tokens("sha1:").is_err());
    }
}
