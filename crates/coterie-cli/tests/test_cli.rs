use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DOCUMENTS: &str = r#"{"id":"d1","sentences":[{"mentions":[{"text":"Aldo Moro","kind":"person","links":[{"reference":"http://dbpedia.org/resource/Aldo_Moro","confidence":0.9,"spotted":true}]},{"text":"Berlinguer","kind":"person"},{"text":"Cossiga","kind":"person"}]}]}
{"id":"d2","sentences":[{"mentions":[{"text":"Aldo Moro","kind":"person"},{"text":"Dalla Chiesa","kind":"person"}]},{"mentions":[{"text":"Berlinguer","kind":"person"},{"text":"Dalla Chiesa","kind":"person"}]}]}
this is not json
"#;

fn coterie() -> Command {
    Command::cargo_bin("coterie").unwrap()
}

#[test]
fn test_cliques_from_documents() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("docs.jsonl");
    let output = dir.path().join("cliques.tsv");
    let links = dir.path().join("links.tsv");
    fs::write(&input, DOCUMENTS)?;

    coterie()
        .arg("cliques")
        .arg("--documents")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--links")
        .arg(&links)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 cliques"));

    // {Moro, Berlinguer, Cossiga} and {Moro, Berlinguer, Dalla Chiesa}.
    let cliques = fs::read_to_string(&output)?;
    assert_eq!(
        cliques,
        "Aldo Moro\tBerlinguer\tCossiga\nAldo Moro\tBerlinguer\tDalla Chiesa\n"
    );

    let links = fs::read_to_string(&links)?;
    assert!(links.contains("Aldo Moro\thttp://dbpedia.org/resource/Aldo_Moro"));
    Ok(())
}

#[test]
fn test_cliques_with_expansion_and_stats() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    let output = dir.path().join("cliques.tsv");
    let stats = dir.path().join("stats.json");
    // Triangle ABC; D touches A and B; E alone.
    fs::write(&input, "A\tB\tC\nA\tD\nB\tD\nE\n")?;

    coterie()
        .arg("cliques")
        .arg("--sentences")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--stats")
        .arg(&stats)
        .arg("--use-almost")
        .arg("--min-almost-clique-size")
        .arg("3")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output)?, "A\tB\tC\tD\n");

    let stats: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats)?)?;
    assert_eq!(stats["cliques"]["cliques"], 1);
    assert_eq!(stats["cliques"]["cliques_modified"], 2);
    assert_eq!(stats["cliques"]["duplicates_merged"], 1);
    Ok(())
}

#[test]
fn test_blacklist_removes_identity() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    let blacklist = dir.path().join("blacklist.txt");
    let output = dir.path().join("cliques.tsv");
    fs::write(&input, "A\tB\tC\n")?;
    fs::write(&blacklist, "C\n")?;

    coterie()
        .arg("cliques")
        .arg("--sentences")
        .arg(&input)
        .arg("--blacklist")
        .arg(&blacklist)
        .arg("--min-clique-size")
        .arg("2")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output)?, "A\tB\n");
    Ok(())
}

#[test]
fn test_co_occurrences_export() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    let output = dir.path().join("pairs.csv");
    fs::write(&input, "A\tB\tC\nA\tB\n")?;

    coterie()
        .arg("co-occurrences")
        .arg("--sentences")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 pairs"));

    assert_eq!(fs::read_to_string(&output)?, "A,B,2\nA,C,1\nB,C,1\n");
    Ok(())
}

#[test]
fn test_co_occurrences_respects_min_edge_weight() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    let output = dir.path().join("pairs.csv");
    fs::write(&input, "A\tB\tC\nA\tB\n")?;

    coterie()
        .arg("co-occurrences")
        .arg("--sentences")
        .arg(&input)
        .arg("--min-edge-weight")
        .arg("2")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 pairs"));

    assert_eq!(fs::read_to_string(&output)?, "A,B,2\n");
    Ok(())
}

#[test]
fn test_invalid_utf8_document_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("docs.jsonl");
    let output = dir.path().join("cliques.tsv");
    let mut bytes = DOCUMENTS.as_bytes().to_vec();
    bytes.extend_from_slice(b"{\"id\":\"\xff\xfe\",\"sentences\":[]}\n");
    fs::write(&input, bytes)?;

    coterie()
        .arg("cliques")
        .arg("--documents")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 cliques"));
    Ok(())
}

#[test]
fn test_pairs_with_min_edge_weight() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("pairs.csv");
    let output = dir.path().join("cliques.tsv");
    fs::write(&input, "A,B,3\nB,C,3\nA,C,3\nC,D,1\n")?;

    coterie()
        .arg("cliques")
        .arg("--pairs")
        .arg(&input)
        .arg("--min-edge-weight")
        .arg("2")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output)?, "A\tB\tC\n");
    Ok(())
}

#[test]
fn test_summarize() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let file = dir.path().join("cliques.tsv");
    fs::write(&file, "A\tB\tC\nA\tB\tC\tD\n")?;

    coterie()
        .arg("summarize")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 cliques"))
        .stdout(predicate::str::contains("7 members"))
        .stdout(predicate::str::contains("3.50 avg"));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    fs::write(&input, "A\tB\tC\n")?;

    coterie()
        .arg("cliques")
        .arg("--sentences")
        .arg(&input)
        .arg("--min-clique-size")
        .arg("0")
        .arg("-o")
        .arg(dir.path().join("out.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

#[test]
fn test_config_file_with_budget() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("sets.tsv");
    let config = dir.path().join("config.json");
    let output = dir.path().join("cliques.tsv");
    fs::write(&input, "A\tB\tC\tD\nX\tY\tZ\n")?;
    fs::write(&config, r#"{"budget": {"max_component_size": 3}}"#)?;

    coterie()
        .arg("cliques")
        .arg("--sentences")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 components"));

    assert_eq!(fs::read_to_string(&output)?, "X\tY\tZ\n");
    Ok(())
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    coterie()
        .arg("cliques")
        .arg("-o")
        .arg(dir.path().join("out.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input given"));
}
