use semver::Version;

/// Parses a semantic version, tolerating a leading `v` or `=`.
pub fn parse(text: &str) -> Option<Version> {
    let trimmed = text.trim().trim_start_matches(['v', '=']);
    Version::parse(trimmed).ok()
}

/// Picks the defined version a block at `requested` may use.
///
/// An exact match wins. Otherwise candidates are scanned in definition order
/// and the last one that is at most `requested` and at least the running
/// baseline is kept; the baseline starts at `default_version` and follows
/// every accepted candidate. Candidates older than `default_version` are
/// therefore never picked.
pub fn resolve<'a, I>(candidates: I, requested: &str, default_version: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&'a str> = candidates.into_iter().collect();
    if let Some(exact) = candidates.iter().copied().find(|c| *c == requested) {
        return Some(exact);
    }

    let requested = parse(requested)?;
    let mut baseline = parse(default_version)?;
    let mut found = None;

    for candidate in candidates {
        let Some(version) = parse(candidate) else {
            continue;
        };
        if requested >= version && version >= baseline {
            baseline = version;
            found = Some(candidate);
        }
    }

    found
}
