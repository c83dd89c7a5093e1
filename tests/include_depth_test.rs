use std::fs;
use std::path::Path;

use templater::document::{Document, DocumentLoader};
use templater::macros::{DEFAULT_INCLUDE_DEPTH_LIMIT, DocumentIncluder};
use templater::progress::NoProgress;
use templater::{DiagnosticKind, RunContext, TemplaterError};

/// Write `part1.txt` .. `partN.txt`, each including the next one
fn write_chain(dir: &Path, length: usize) {
    for i in 1..=length {
        let body = if i < length {
            format!("level {i}\n\n%INCLUDE(part{}.txt)%", i + 1)
        } else {
            format!("level {i}")
        };
        fs::write(dir.join(format!("part{i}.txt")), body).unwrap();
    }
}

fn template() -> Document {
    let mut document = Document::new("template");
    document.push_paragraph("%INCLUDE(part1.txt)%");
    document
}

#[test]
fn test_chain_at_depth_limit_resolves() {
    let dir = tempfile::tempdir().unwrap();
    write_chain(dir.path(), DEFAULT_INCLUDE_DEPTH_LIMIT);
    let loader = DocumentLoader::new(dir.path());

    let mut document = template();
    let mut context = RunContext::new();
    let passes = DocumentIncluder::new(&loader)
        .process(&mut document, None, &mut context, &mut NoProgress)
        .expect("a chain of 16 files must resolve");

    assert_eq!(passes, DEFAULT_INCLUDE_DEPTH_LIMIT);
    assert_eq!(document.paragraphs().count(), DEFAULT_INCLUDE_DEPTH_LIMIT);
    assert!(
        document
            .paragraphs()
            .all(|p| !p.text().contains("%INCLUDE"))
    );
    assert_eq!(loader.open_documents(), 0);
}

#[test]
fn test_chain_beyond_depth_limit_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_chain(dir.path(), DEFAULT_INCLUDE_DEPTH_LIMIT + 1);
    let loader = DocumentLoader::new(dir.path());

    let mut document = template();
    let error = DocumentIncluder::new(&loader)
        .process(&mut document, None, &mut RunContext::new(), &mut NoProgress)
        .unwrap_err();

    match error.downcast_ref::<TemplaterError>() {
        Some(TemplaterError::IncludeDepthExceeded { limit, pending }) => {
            assert_eq!(*limit, DEFAULT_INCLUDE_DEPTH_LIMIT);
            assert_eq!(pending, "%INCLUDE(part17.txt)%");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(loader.open_documents(), 0);
}

#[test]
fn test_cycle_fails_with_depth_exceeded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("part1.txt"), "ping\n\n%INCLUDE(part2.txt)%").unwrap();
    fs::write(dir.path().join("part2.txt"), "pong\n\n%INCLUDE(part1.txt)%").unwrap();
    let loader = DocumentLoader::new(dir.path());

    let mut document = template();
    let error = DocumentIncluder::new(&loader)
        .process(&mut document, None, &mut RunContext::new(), &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<TemplaterError>(),
        Some(TemplaterError::IncludeDepthExceeded { .. })
    ));
}

#[test]
fn test_configured_limit_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    write_chain(dir.path(), 3);
    let loader = DocumentLoader::new(dir.path());

    let mut document = template();
    let result = DocumentIncluder::with_depth_limit(&loader, 2).process(
        &mut document,
        None,
        &mut RunContext::new(),
        &mut NoProgress,
    );
    assert!(result.is_err());
}

#[test]
fn test_missing_include_warns_once_and_stays() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("part1.txt"),
        "%INCLUDE(gone.txt)%\n\n%INCLUDE(gone.txt)%",
    )
    .unwrap();
    let loader = DocumentLoader::new(dir.path());

    let mut document = template();
    let mut context = RunContext::new();
    DocumentIncluder::new(&loader)
        .process(&mut document, None, &mut context, &mut NoProgress)
        .expect("a missing file is not fatal");

    let texts: Vec<String> = document.paragraphs().map(|p| p.text()).collect();
    assert_eq!(texts, ["%INCLUDE(gone.txt)%", "%INCLUDE(gone.txt)%"]);
    assert_eq!(
        context
            .diagnostics_of(DiagnosticKind::MissingInclude)
            .count(),
        1
    );
    assert!(context.is_known_missing("%INCLUDE(gone.txt)%"));
}
