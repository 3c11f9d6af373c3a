//! End-to-end tests of the mcqdigest binary against the checked-in fixtures.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Command running inside an empty directory so no stray config is picked up.
fn mcqdigest(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mcqdigest").unwrap();
    cmd.current_dir(workdir.path()).env_remove("MCQDIGEST_CONFIG");
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn article<'a>(catalog: &'a Value, key: &str) -> &'a Value {
    catalog["articles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["news_item_id"] == key || a["id"].to_string() == key)
        .unwrap_or_else(|| panic!("article {} not found", key))
}

const COMMON: [&str; 4] = [
    "あなたはニュース記事から理解度テストを作成する専門家です。",
    "記事の内容だけに基づいて問題を作成してください。",
    "問題は3問作成してください。",
    "出力はJSON形式で返してください。",
];

#[test]
fn test_articles_merge_fixture_directory() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("articles.json");

    mcqdigest(&workdir)
        .args(["articles", "--data-dir"])
        .arg(fixtures().join("data"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 articles"));

    let catalog = read_json(&out);
    assert_eq!(catalog["articleCount"], 4);
    assert_eq!(catalog["types"], serde_json::json!(["1", "7", "9"]));
    assert!(catalog["generatedAt"].is_string());

    let order: Vec<String> = catalog["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| match &a["news_item_id"] {
            Value::String(s) => s.clone(),
            _ => a["id"].to_string(),
        })
        .collect();
    assert_eq!(order, vec!["n-001", "n-002", "n-003", "5005"]);

    let cherry = article(&catalog, "n-002");
    assert_eq!(cherry["headline"], "桜の開花、東京で観測");
    assert!(cherry.get("sub_headline").is_none());
    assert!(cherry["questionTypes"]["type1"].is_array());
    assert!(cherry["questionTypes"]["type7"].is_array());
    assert!(cherry["questionTypes"].get("type9").is_none());

    let rocket = article(&catalog, "n-003");
    assert_eq!(rocket["questionTypes"]["type9"][0]["answer"], 0);

    let numeric = article(&catalog, "5005");
    assert_eq!(numeric["id"], 5005);
}

#[test]
fn test_articles_last_write_policy() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("articles.json");

    mcqdigest(&workdir)
        .args(["articles", "--merge-policy", "last-write", "--data-dir"])
        .arg(fixtures().join("data"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let catalog = read_json(&out);
    let cherry = article(&catalog, "n-002");
    assert_eq!(cherry["headline"], "東京で桜が開花");
    assert_eq!(cherry["sub_headline"], "平年より早く");
    assert_eq!(cherry["content"], "気象庁は東京で桜の開花を観測したと発表した。");
}

#[test]
fn test_articles_sort_by_date() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("articles.json");

    mcqdigest(&workdir)
        .args(["articles", "--sort", "date", "--data-dir"])
        .arg(fixtures().join("data"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let catalog = read_json(&out);
    let headlines: Vec<&str> = catalog["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["headline"].as_str().unwrap())
        .collect();
    assert_eq!(
        headlines,
        vec![
            "数値IDの記事",
            "桜の開花、東京で観測",
            "日銀が金利を引き上げ",
            "新型ロケットの打ち上げ成功",
        ]
    );
}

#[test]
fn test_articles_missing_source_is_partial() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("articles.json");
    let data = fixtures().join("data");

    mcqdigest(&workdir)
        .arg("articles")
        .arg("--source")
        .arg(format!("1={}", data.join("news_mcq3_with_gemma3_type1_sample3.jsonl").display()))
        .arg("--source")
        .arg(format!("4={}", data.join("news_mcq3_with_gemma3_type4_sample3.jsonl").display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("partial"));

    let catalog = read_json(&out);
    assert_eq!(catalog["articleCount"], 2);
    assert_eq!(catalog["types"], serde_json::json!(["1", "4"]));
}

#[test]
fn test_articles_markdown_digest() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("digest.md");

    mcqdigest(&workdir)
        .args(["articles", "--format", "markdown", "--data-dir"])
        .arg(fixtures().join("data"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let markdown = fs::read_to_string(&out).unwrap();
    assert!(markdown.contains("# MCQ Article Digest"));
    assert!(markdown.contains("### 1. 日銀が金利を引き上げ"));
    assert!(markdown.contains("#### type7 (1 questions)"));
    assert!(markdown.contains("1. マイナス金利の解除"));
}

#[test]
fn test_articles_without_sources_fails() {
    let workdir = TempDir::new().unwrap();

    mcqdigest(&workdir)
        .args(["articles", "--data-dir"])
        .arg(workdir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No article sources found"));
}

#[test]
fn test_instructions_common_and_specific() {
    let workdir = TempDir::new().unwrap();
    let out = workdir.path().join("src/data/instructions.json");

    mcqdigest(&workdir)
        .args(["instructions", "--source-dir"])
        .arg(fixtures().join("generators"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Common sentences: 4"));

    let summary = read_json(&out);
    assert_eq!(summary["commonInstructions"], serde_json::json!(COMMON));

    let types = summary["types"].as_object().unwrap();
    assert_eq!(types.len(), 3);
    assert_eq!(
        summary["types"]["1"]["typeSpecificInstructions"],
        serde_json::json!(["事実関係を問う問題にしてください。"])
    );
    assert_eq!(
        summary["types"]["7"]["typeSpecificInstructions"],
        serde_json::json!([
            "数値や日付に関する問題を優先してください。",
            "難易度は高めにしてください。"
        ])
    );
    assert_eq!(
        summary["types"]["9"]["typeSpecificInstructions"],
        serde_json::json!(["記事の背景や因果関係を問う問題にしてください。"])
    );
    assert_eq!(summary["types"]["7"]["systemInstructions"].as_array().unwrap().len(), 6);
    assert!(summary["types"]["9"]["source"]
        .as_str()
        .unwrap()
        .ends_with("append_news_mcq3_with_gemma3_type9.py"));
    assert!(summary["types"]["1"]["fullText"]
        .as_str()
        .unwrap()
        .starts_with(COMMON[0]));
}

#[test]
fn test_instructions_missing_block_is_partial() {
    let workdir = TempDir::new().unwrap();
    let broken = workdir.path().join("gen_type3.py");
    fs::write(&broken, "PROMPT = 'no instructions here'\n").unwrap();
    let out = workdir.path().join("instructions.json");
    let generators = fixtures().join("generators");

    mcqdigest(&workdir)
        .arg("instructions")
        .arg("--source")
        .arg(format!("1={}", generators.join("append_news_mcq3_with_gemma3_type1.py").display()))
        .arg("--source")
        .arg(format!("3={}", broken.display()))
        .arg("--source")
        .arg(format!("9={}", generators.join("append_news_mcq3_with_gemma3_type9.py").display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .code(2);

    let summary = read_json(&out);
    assert!(summary["types"].get("3").is_none());
    assert_eq!(summary["commonInstructions"], serde_json::json!(COMMON));
}

#[test]
fn test_instructions_nothing_extractable_fails() {
    let workdir = TempDir::new().unwrap();
    let broken = workdir.path().join("gen_type1.py");
    fs::write(&broken, "print('hello')\n").unwrap();
    let out = workdir.path().join("instructions.json");

    mcqdigest(&workdir)
        .arg("instructions")
        .arg("--source")
        .arg(format!("1={}", broken.display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no extractable instructions"));

    assert!(!out.exists());
}

#[test]
fn test_instructions_plain_text_sources() {
    let workdir = TempDir::new().unwrap();
    let a = workdir.path().join("a.txt");
    let b = workdir.path().join("b.txt");
    fs::write(&a, "Do X. Do Y.").unwrap();
    fs::write(&b, "Do X. Do Z.").unwrap();
    let out = workdir.path().join("instructions.json");

    mcqdigest(&workdir)
        .args(["instructions", "--plain", "--terminators", "."])
        .arg("--source")
        .arg(format!("1={}", a.display()))
        .arg("--source")
        .arg(format!("2={}", b.display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let summary = read_json(&out);
    assert_eq!(summary["commonInstructions"], serde_json::json!(["Do X."]));
    assert_eq!(
        summary["types"]["1"]["typeSpecificInstructions"],
        serde_json::json!(["Do Y."])
    );
    assert_eq!(
        summary["types"]["2"]["typeSpecificInstructions"],
        serde_json::json!(["Do Z."])
    );
}

#[test]
fn test_config_file_supplies_sources() {
    let workdir = TempDir::new().unwrap();
    let data = fixtures().join("data");
    let config = format!(
        "[articles]\noutput = \"out/catalog.json\"\nmerge_policy = \"last-write\"\nsources = [\n  {{ label = \"7\", path = \"{}\" }},\n]\n",
        data.join("news_mcq3_with_gemma3_type7_sample3.jsonl")
            .display()
            .to_string()
            .replace('\\', "\\\\")
    );
    fs::write(workdir.path().join(".mcqdigest.toml"), config).unwrap();

    mcqdigest(&workdir).arg("articles").assert().success();

    let catalog = read_json(&workdir.path().join("out/catalog.json"));
    assert_eq!(catalog["articleCount"], 3);
    assert_eq!(catalog["types"], serde_json::json!(["7"]));
}

#[test]
fn test_init_config_writes_once() {
    let workdir = TempDir::new().unwrap();

    mcqdigest(&workdir)
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .mcqdigest.toml"));

    let content = fs::read_to_string(workdir.path().join(".mcqdigest.toml")).unwrap();
    assert!(content.contains("[articles]"));
    assert!(content.contains("[instructions]"));

    mcqdigest(&workdir).arg("--init-config").assert().code(1);
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let workdir = TempDir::new().unwrap();

    mcqdigest(&workdir)
        .args(["articles", "--verbose", "--quiet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--verbose and --quiet"));
}
