//! Pinned-version asset construction (no network).

use super::{AssetDescriptor, AssetQuery, ResolutionError};
use crate::platform;

/// Expands `{name}` placeholders in `template` from `vars`.
///
/// Unknown or unterminated placeholders are errors so a typo cannot silently
/// produce a plausible-looking but wrong file name.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> Result<String, ResolutionError> {
    let invalid = |reason: String| ResolutionError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| invalid("unterminated placeholder".to_string()))?;
        let key = &after[..close];
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| invalid(format!("unknown placeholder {{{key}}}")))?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Builds the descriptor for `version` from the query's template and download base.
pub fn pinned_descriptor(
    query: &AssetQuery,
    version: &str,
) -> Result<AssetDescriptor, ResolutionError> {
    let file_name = expand_template(
        &query.pinned_template,
        &[
            ("binary", query.binary.as_str()),
            ("version", version),
            ("target", platform::target_label()),
            ("ext", platform::archive_ext()),
        ],
    )?;
    if file_name.is_empty() || file_name.contains(['/', '\\']) {
        return Err(ResolutionError::InvalidTemplate {
            template: query.pinned_template.clone(),
            reason: format!("'{file_name}' is not a single file name"),
        });
    }

    let invalid_url = |reason: String| ResolutionError::InvalidUrl {
        base: query.download_base.clone(),
        reason,
    };
    let mut url = url::Url::parse(&query.download_base).map_err(|e| invalid_url(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid_url("base cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend([
            query.org.as_str(),
            query.repo.as_str(),
            "releases",
            "download",
            version,
            file_name.as_str(),
        ]);

    Ok(AssetDescriptor {
        url: url.to_string(),
        file_name,
        tag: version.to_string(),
    })
}
