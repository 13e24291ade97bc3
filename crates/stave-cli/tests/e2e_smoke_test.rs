use std::{fs, path::PathBuf};

use tempfile::tempdir;

use stave_cli::{Args, Breaker, run};

/// Collects all .toml files from a directory
fn collect_score_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn scores_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scores")
}

fn args(input: &PathBuf, output: &PathBuf, breaker: Option<Breaker>) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        breaker,
        dump_columns: false,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_scores() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let scores = collect_score_files(scores_dir());
    assert!(!scores.is_empty(), "No scores found in scores/");

    let mut failed = Vec::new();
    for breaker in [Breaker::Simple, Breaker::Optimal] {
        for score_path in &scores {
            let output_path = temp_dir.path().join(format!(
                "{}-{breaker:?}.svg",
                score_path.file_stem().unwrap().to_string_lossy()
            ));

            match run(&args(score_path, &output_path, Some(breaker))) {
                Ok(()) => {
                    let svg = fs::read_to_string(&output_path).unwrap();
                    assert!(svg.contains("<svg"), "{} is not an SVG", output_path.display());
                }
                Err(err) => failed.push((score_path.clone(), breaker, err)),
            }
        }
    }

    if !failed.is_empty() {
        eprintln!("\nScores that failed:");
        for (path, breaker, err) in &failed {
            eprintln!("  - {} ({breaker:?}): {err}", path.display());
        }
        panic!("{} score(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_scores() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let scores = collect_score_files(scores_dir().join("errors"));
    assert!(!scores.is_empty(), "No error scores found in scores/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for score_path in &scores {
        let output_path = temp_dir.path().join(format!(
            "error_{}.svg",
            score_path.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args(score_path, &output_path, None)).is_ok() {
            unexpectedly_succeeded.push(score_path.clone());
        }
    }

    assert!(
        unexpectedly_succeeded.is_empty(),
        "Error scores succeeded unexpectedly: {unexpectedly_succeeded:?}"
    );
}

#[test]
fn e2e_explicit_config_and_dump() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[line_break]\nline_width = 6000.0\nfirst_line_indent = 800.0\n",
    )
    .unwrap();

    let input = scores_dir().join("simple.toml");
    let output = temp_dir.path().join("simple.svg");
    let mut args = args(&input, &output, None);
    args.config = Some(config_path.to_string_lossy().to_string());
    args.dump_columns = true;

    run(&args).expect("simple score with explicit config");
    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.matches("class=\"system\"").count() > 1);
}

/// Value of attribute `name` in a single SVG tag.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let start = tag.find(&format!(" {name}=\""))? + name.len() + 3;
    let end = start + tag[start..].find('"')?;
    Some(&tag[start..end])
}

#[test]
fn e2e_duet_aligns_simultaneous_notes() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = scores_dir().join("duet.toml");
    let output = temp_dir.path().join("duet.svg");
    run(&args(&input, &output, None)).expect("duet score");

    let svg = fs::read_to_string(&output).unwrap();
    let mut notes: Vec<(usize, f32)> = svg
        .split("<rect")
        .skip(1)
        .filter_map(|rest| {
            let tag = &rest[..rest.find('>')?];
            if attribute(tag, "class")? != "note" {
                return None;
            }
            let entry = attribute(tag, "data-entry")?.parse().ok()?;
            let x = attribute(tag, "x")?.parse().ok()?;
            Some((entry, x))
        })
        .collect();
    notes.sort_by_key(|&(entry, _)| entry);

    // both instruments play a quarter note on every beat of two measures
    assert_eq!(notes.len(), 16);
    for pair in notes.chunks(2) {
        assert!(
            (pair[0].1 - pair[1].1).abs() < 0.01,
            "entries {} and {} are not aligned",
            pair[0].0,
            pair[1].0
        );
    }
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("absent.toml");
    let output = temp_dir.path().join("absent.svg");
    assert!(run(&args(&input, &output, None)).is_err());
    assert!(!output.exists());
}
