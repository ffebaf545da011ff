//! Reproducible sample dataset used when no metadata file is available.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

use super::model::{DATE_FORMAT, Paper, PaperTable, Schema};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLE_SIZE: usize = 5000;

pub const JOURNALS: [&str; 15] = [
    "Nature",
    "Science",
    "Cell",
    "Lancet",
    "New England Journal of Medicine",
    "JAMA",
    "BMJ",
    "PLoS ONE",
    "Nature Medicine",
    "Science Translational Medicine",
    "Journal of Virology",
    "Virology",
    "Clinical Infectious Diseases",
    "Emerging Infectious Diseases",
    "Journal of Medical Virology",
];

pub const SOURCES: [&str; 6] = ["PMC", "Medline", "bioRxiv", "medRxiv", "ArXiv", "WHO"];

pub const TITLE_KEYWORDS: [&str; 20] = [
    "COVID-19",
    "SARS-CoV-2",
    "coronavirus",
    "pandemic",
    "vaccination",
    "treatment",
    "diagnosis",
    "epidemiology",
    "transmission",
    "symptoms",
    "clinical",
    "therapeutic",
    "antiviral",
    "antibody",
    "immunity",
    "respiratory",
    "pneumonia",
    "outbreak",
    "public health",
    "lockdown",
];

/// Generate `n` papers from `seed`. The same arguments always give the same table.
///
/// Publication dates come from a chain of independent draws: 10% land in the
/// 31 days from 2019-12-01, otherwise 50% of the rest in 2020, otherwise 80% of
/// the rest in 2021, and the remainder in 2022. The stated shares are per-row
/// probabilities, so realised proportions only approximate them.
pub fn synthesize(seed: u64, n: usize) -> PaperTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..n).map(|i| synthesize_paper(&mut rng, i)).collect();
    PaperTable::new(Schema::cord19(), rows)
}

fn synthesize_paper(rng: &mut StdRng, i: usize) -> Paper {
    let published = publication_date(rng);

    let num_keywords = rng.gen_range(2..5);
    let keywords: Vec<&str> = index::sample(rng, TITLE_KEYWORDS.len(), num_keywords)
        .into_iter()
        .map(|k| TITLE_KEYWORDS[k])
        .collect();
    let title = format!("Analysis of {} in clinical settings", keywords.join(" and "));

    let abstract_text = if rng.gen::<f64>() > 0.05 {
        let abstract_length = rng.gen_range(100..500);
        Some(format!(
            "This study examines {} with {abstract_length} word abstract...",
            keywords[0]
        ))
    } else {
        None
    };

    let authors = if rng.gen::<f64>() > 0.02 {
        let num_authors = rng.gen_range(1..8);
        Some(if num_authors > 1 {
            format!("Author{i}_1, Author{i}_2")
        } else {
            format!("Author{i}_1")
        })
    } else {
        None
    };

    let journal = present(rng, 0.1).then(|| pick(rng, &JOURNALS));
    let publish_time = if present(rng, 0.05) {
        published.map(|d| d.format(DATE_FORMAT).to_string())
    } else {
        None
    };
    let source = Some(pick(rng, &SOURCES));
    let doi = present(rng, 0.1).then(|| format!("10.1000/sample.{i}"));
    let pmcid = present(rng, 0.3).then(|| format!("PMC{}", 1_000_000 + i));
    let url = present(rng, 0.2).then(|| format!("https://example.com/paper_{i}"));

    Paper {
        cord_uid: Some(format!("cord-{i:06}")),
        title: Some(title),
        abstract_text,
        authors,
        journal,
        publish_time,
        source,
        doi,
        pmcid,
        url,
        extra: Default::default(),
    }
}

/// Piecewise date draw weighted toward 2020-2021.
fn publication_date(rng: &mut StdRng) -> Option<NaiveDate> {
    let (year, month, window) = if rng.gen::<f64>() < 0.1 {
        (2019, 12, 31)
    } else if rng.gen::<f64>() < 0.5 {
        (2020, 1, 365)
    } else if rng.gen::<f64>() < 0.8 {
        (2021, 1, 365)
    } else {
        (2022, 1, 365)
    };
    let offset = rng.gen_range(0..window);
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(offset))
}

/// A value is present when the draw exceeds `missing_rate`.
fn present(rng: &mut StdRng, missing_rate: f64) -> bool {
    rng.gen::<f64>() > missing_rate
}

fn pick(rng: &mut StdRng, choices: &[&str]) -> String {
    choices.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_same_seed_same_table() {
        assert_eq!(synthesize(42, 200), synthesize(42, 200));
        assert_ne!(synthesize(42, 200), synthesize(7, 200));
    }

    #[test]
    fn test_identifiers_are_sequential_and_unique() {
        let table = synthesize(DEFAULT_SEED, 50);
        assert_eq!(table.rows[0].cord_uid.as_deref(), Some("cord-000000"));
        assert_eq!(table.rows[49].cord_uid.as_deref(), Some("cord-000049"));
    }

    #[test]
    fn test_titles_use_two_to_four_distinct_keywords() {
        let table = synthesize(DEFAULT_SEED, 300);
        for paper in &table.rows {
            let title = paper.title.as_deref().unwrap();
            let inner = title
                .strip_prefix("Analysis of ")
                .and_then(|t| t.strip_suffix(" in clinical settings"))
                .unwrap();
            let parts: Vec<&str> = inner.split(" and ").collect();
            assert!((2..=4).contains(&parts.len()), "{title}");
            let mut dedup = parts.clone();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(dedup.len(), parts.len(), "{title}");
        }
    }

    #[test]
    fn test_presence_rates_are_plausible() {
        let table = synthesize(DEFAULT_SEED, 5000);
        let n = table.len() as f64;
        let share = |f: fn(&Paper) -> bool| table.rows.iter().filter(|p| f(p)).count() as f64 / n;

        assert!((share(|p| p.abstract_text.is_some()) - 0.95).abs() < 0.02);
        assert!((share(|p| p.authors.is_some()) - 0.98).abs() < 0.02);
        assert!((share(|p| p.journal.is_some()) - 0.90).abs() < 0.02);
        assert_eq!(share(|p| p.source.is_some()), 1.0);
    }

    #[test]
    fn test_dates_fall_in_expected_windows() {
        let table = synthesize(DEFAULT_SEED, 2000);
        for paper in &table.rows {
            let Some(raw) = paper.publish_time.as_deref() else {
                continue;
            };
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap();
            match date.year() {
                2019 => assert_eq!(date.month(), 12),
                2020..=2022 => {}
                other => panic!("unexpected year {other}"),
            }
        }
    }
}
