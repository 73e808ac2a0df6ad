use crate::{
    corpus::MetadataTable,
    error::{AppError, AppResult},
    models::{EnrichmentRecord, MetadataRecord, RankedCandidate, ResultItem},
};

pub const DEFAULT_POSTER: &str = "https://via.placeholder.com/500x750";
pub const DEFAULT_OVERVIEW: &str = "Plot details arriving soon...";
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Merges ranked rows with their enrichment results, index by index
///
/// Each field is resolved on its own: the enrichment value when present, else the
/// local metadata value, else a fixed default. Blank strings and zero numbers
/// count as absent. A missing `enriched` slot is treated as `None`.
pub fn assemble(
    ranked: &[RankedCandidate],
    local: &MetadataTable,
    enriched: &[Option<EnrichmentRecord>],
) -> AppResult<Vec<ResultItem>> {
    ranked
        .iter()
        .enumerate()
        .map(|(slot, candidate)| {
            let record = local.get(candidate.row).ok_or(AppError::IndexOutOfRange {
                row: candidate.row,
                len: local.len(),
            })?;
            let remote = enriched.get(slot).and_then(Option::as_ref);
            Ok(merge(candidate, record, remote))
        })
        .collect()
}

fn merge(
    candidate: &RankedCandidate,
    local: &MetadataRecord,
    remote: Option<&EnrichmentRecord>,
) -> ResultItem {
    ResultItem {
        title: local.title.clone(),
        poster_path: pick_text(remote.and_then(|r| r.poster_url.as_deref()), None, DEFAULT_POSTER),
        overview: pick_text(
            remote.and_then(|r| r.overview.as_deref()),
            local.overview.as_deref(),
            DEFAULT_OVERVIEW,
        ),
        genres: pick_text(None, local.genres.as_deref(), ""),
        tagline: pick_text(None, local.tagline.as_deref(), ""),
        original_language: pick_text(
            remote.and_then(|r| r.original_language.as_deref()),
            local.original_language.as_deref(),
            DEFAULT_LANGUAGE,
        )
        .to_uppercase(),
        vote_average: round_tenth(pick_number(
            remote.and_then(|r| r.vote_average),
            local.vote_average,
        )),
        popularity: round_tenth(pick_number(
            remote.and_then(|r| r.popularity),
            local.popularity,
        )),
        similarity: candidate.score,
        is_searched: false,
    }
}

fn pick_text(remote: Option<&str>, local: Option<&str>, default: &str) -> String {
    remote
        .filter(|value| !value.trim().is_empty())
        .or_else(|| local.filter(|value| !value.trim().is_empty()))
        .unwrap_or(default)
        .to_string()
}

fn pick_number(remote: Option<f64>, local: Option<f64>) -> f64 {
    let usable = |value: &f64| value.is_finite() && *value != 0.0;
    remote
        .filter(usable)
        .or_else(|| local.filter(usable))
        .unwrap_or(0.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
