//! Whole-package analysis: package → images → manifest → sections → toc.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use bookstruct_classify::{classify_entry, classify_image};
use bookstruct_markup::{SegmentOptions, extract_sections};
use bookstruct_package::Package;
use bookstruct_shared::paths::strip_fragment;
use bookstruct_shared::{ContentType, EngineConfig, ImageSet, Result};

use crate::model::{ClassifiedItem, DocumentModel, DocumentSections, ImageEntry, SCHEMA_VERSION};
use crate::progress::ProgressReporter;

/// Analyze the unpacked package at `root`.
///
/// Fails only when `root` is not a usable directory. Documents that cannot
/// be read come back with no sections.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn analyze_package(
    root: &Path,
    config: &EngineConfig,
    progress: &dyn ProgressReporter,
) -> Result<DocumentModel> {
    let start = Instant::now();

    // --- Phase 1: Package and image inventory ---
    progress.phase("Reading package");
    let package = Package::open(root, config)?;

    // --- Phase 2: Manifest classification ---
    progress.phase("Classifying manifest");
    let manifest = classify_manifest(&package);
    let images = classify_images(&package);

    // --- Phase 3: Segmentation ---
    progress.phase("Segmenting documents");
    // Reading order first, then everything else the package holds.
    let reading_order = package.reading_order();
    let paths = package.content_documents();
    let opts = SegmentOptions::from(config);
    let documents = segment_all(&package, &paths, &manifest, &opts, config.parallel, progress);

    // --- Phase 4: Navigation ---
    progress.phase("Building table of contents");
    let navigation = bookstruct_classify::build(package.navigation());

    let model = DocumentModel {
        schema_version: SCHEMA_VERSION,
        root: root.display().to_string(),
        opf_path: package.opf_path().map(String::from),
        analyzed_at: Utc::now(),
        manifest,
        reading_order,
        documents,
        navigation,
        images,
        cover: package.cover(),
    };

    progress.done(&model);

    info!(
        documents = model.documents.len(),
        sections = model.section_count(),
        chapters = model.count_of(ContentType::Chapter),
        elapsed_ms = start.elapsed().as_millis(),
        "analysis complete"
    );

    Ok(model)
}

/// Segment a single package-relative document.
pub fn analyze_document(
    package: &Package,
    path: &str,
    opts: &SegmentOptions,
) -> Result<DocumentSections> {
    let text = package.read_document(path)?;
    Ok(DocumentSections {
        path: path.to_string(),
        content_type: None,
        content_hash: content_hash(&text),
        sections: extract_sections(&text, path, package.images(), opts),
    })
}

/// Classify every manifest entry and mark spine membership.
pub fn classify_manifest(package: &Package) -> Vec<ClassifiedItem> {
    let in_spine: HashSet<&str> = package.spine().iter().map(|s| s.idref.as_str()).collect();

    package
        .manifest()
        .iter()
        .map(|entry| {
            let classification = classify_entry(entry);
            ClassifiedItem {
                id: entry.id.clone(),
                href: entry.href.clone(),
                media_type: entry.media_type.clone(),
                content_type: classification.content_type,
                ordinal: classification.ordinal,
                in_spine: in_spine.contains(entry.id.as_str()),
            }
        })
        .collect()
}

/// Every image of the package with its guessed role, sorted by path.
pub fn classify_images(package: &Package) -> Vec<ImageEntry> {
    image_entries(package.images(), package.manifest())
}

fn image_entries(images: &ImageSet, manifest: &[bookstruct_shared::ManifestEntry]) -> Vec<ImageEntry> {
    images
        .sorted()
        .into_iter()
        .map(|path| {
            let id = manifest
                .iter()
                .find(|e| strip_fragment(&e.href) == path)
                .map(|e| e.id.as_str())
                .unwrap_or_default();
            ImageEntry {
                path: path.to_string(),
                kind: classify_image(path, id),
            }
        })
        .collect()
}

fn segment_all(
    package: &Package,
    paths: &[String],
    manifest: &[ClassifiedItem],
    opts: &SegmentOptions,
    parallel: bool,
    progress: &dyn ProgressReporter,
) -> Vec<DocumentSections> {
    let total = paths.len();
    let completed = AtomicUsize::new(0);

    let segment_one = |path: &String| {
        let mut doc = match analyze_document(package, path, opts) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%path, error = %e, "unreadable document, no sections");
                DocumentSections {
                    path: path.clone(),
                    content_type: None,
                    content_hash: String::new(),
                    sections: Vec::new(),
                }
            }
        };
        doc.content_type = manifest
            .iter()
            .find(|item| strip_fragment(&item.href) == path.as_str())
            .map(|item| item.content_type);

        debug!(%path, sections = doc.sections.len(), "segmented");
        let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress.document_done(path, current, total);
        doc
    };

    // The image set is read-only here, so documents can be segmented independently.
    if parallel {
        paths.par_iter().map(segment_one).collect()
    } else {
        paths.iter().map(segment_one).collect()
    }
}

/// Hex SHA-256 of a document's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use std::fs;
    use std::sync::Mutex;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="cover-image" href="Images/cover.jpg" media-type="image/jpeg" properties="cover-image"/>
    <item id="fig1" href="Images/B0001_01_01.png" media-type="image/png"/>
    <item id="part-id357" href="Text/part01.xhtml" media-type="application/xhtml+xml"/>
    <item id="chapter-1" href="Text/chapter-1.xhtml" media-type="application/xhtml+xml"/>
    <item id="appendix-a" href="Text/appendix-a.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="part-id357"/>
    <itemref idref="chapter-1"/>
    <itemref idref="appendix-a"/>
  </spine>
</package>"#;

    const NAV: &str = r#"<html xmlns:epub="http://www.idpf.org/2007/ops"><body>
<nav epub:type="toc"><ol>
  <li><a href="Text/part01.xhtml">Part 1</a><ol>
    <li><a href="Text/chapter-1.xhtml">Chapter 1: Getting Started</a></li>
  </ol></li>
  <li><a href="Text/appendix-a.xhtml">Appendix A</a></li>
</ol></nav></body></html>"#;

    const CHAPTER: &str = r#"<html><body><div class="wrapper"><div class="inner">
  <p>Opening words.</p>
  <h1>Getting Started</h1>
  <p>First paragraph.</p>
  <div class="figure"><img src="../Images/B0001_01_01.png"/></div>
  <p class="nav-links"><a href="a.xhtml">Previous chapter in the book</a> <a href="b.xhtml">Next chapter in the book</a></p>
  <h2>Installing</h2>
  <p>Run the installer.</p>
</div></div></body></html>"#;

    fn sample_package() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "META-INF/container.xml",
            r#"<container><rootfiles><rootfile full-path="OEBPS/content.opf"/></rootfiles></container>"#,
        );
        write(dir.path(), "OEBPS/content.opf", OPF);
        write(dir.path(), "OEBPS/nav.xhtml", NAV);
        write(dir.path(), "OEBPS/Images/cover.jpg", "jpg");
        write(dir.path(), "OEBPS/Images/B0001_01_01.png", "png");
        write(dir.path(), "OEBPS/Text/part01.xhtml", "<html><body><h1>Part 1</h1></body></html>");
        write(dir.path(), "OEBPS/Text/chapter-1.xhtml", CHAPTER);
        write(dir.path(), "OEBPS/Text/appendix-a.xhtml", "<html><body><p>Extra</p></body></html>");
        dir
    }

    #[test]
    fn analyzes_whole_package() {
        let dir = sample_package();
        let model = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");

        assert_eq!(model.schema_version, SCHEMA_VERSION);
        assert_eq!(model.opf_path.as_deref(), Some("OEBPS/content.opf"));
        assert_eq!(
            model.reading_order,
            vec![
                "OEBPS/Text/part01.xhtml",
                "OEBPS/Text/chapter-1.xhtml",
                "OEBPS/Text/appendix-a.xhtml"
            ]
        );

        let part = model.manifest.iter().find(|i| i.id == "part-id357").expect("part");
        assert_eq!(part.content_type, ContentType::Part);
        assert_eq!(part.ordinal, Some(357));
        assert!(part.in_spine);
        assert_eq!(model.count_of(ContentType::Chapter), 1);
        assert_eq!(model.count_of(ContentType::BackMatter), 1);

        let cover = model.cover.as_ref().expect("cover");
        assert_eq!(cover.path, "OEBPS/Images/cover.jpg");
        assert_eq!(model.images.len(), 2);
    }

    #[test]
    fn segments_documents_in_reading_order() {
        let dir = sample_package();
        let model = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");

        let chapter = model.document("OEBPS/Text/chapter-1.xhtml").expect("chapter");
        assert_eq!(chapter.content_type, Some(ContentType::Chapter));
        assert_eq!(chapter.content_hash.len(), 64);

        let headers: Vec<&str> = chapter.sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(headers, vec!["Intro", "Getting Started", "Installing"]);

        let started = &chapter.sections[1];
        // Header, paragraph and figure; the link bar is dropped.
        assert_eq!(started.blocks.len(), 3);
        assert_eq!(started.images.len(), 1);
        assert_eq!(started.images[0].path, "OEBPS/Images/B0001_01_01.png");
    }

    #[test]
    fn segments_documents_outside_the_spine() {
        let dir = sample_package();
        write(
            dir.path(),
            "OEBPS/content.opf",
            &OPF.replace(
                "</manifest>",
                r#"<item id="notes" href="Text/notes.xhtml" media-type="application/xhtml+xml"/></manifest>"#,
            ),
        );
        write(dir.path(), "OEBPS/Text/notes.xhtml", "<html><body><h1>Notes</h1><p>n</p></body></html>");
        write(dir.path(), "OEBPS/Misc/extra.html", "<html><body><h1>Extra</h1></body></html>");

        let model = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");
        assert_eq!(model.reading_order.len(), 3);

        let paths: Vec<&str> = model.documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(&paths[..3], model.reading_order.iter().map(String::as_str).collect::<Vec<_>>().as_slice());
        assert!(paths.contains(&"OEBPS/nav.xhtml"));
        assert!(paths.contains(&"OEBPS/Text/notes.xhtml"));
        assert!(paths.contains(&"OEBPS/Misc/extra.html"));
        assert_eq!(paths.len(), 6);

        let extra = model.document("OEBPS/Misc/extra.html").expect("extra");
        assert_eq!(extra.content_type, None);
        assert_eq!(extra.sections[0].header, "Extra");
    }

    #[test]
    fn builds_navigation_tree() {
        let dir = sample_package();
        let model = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");

        assert_eq!(model.navigation.len(), 2);
        let part = &model.navigation[0];
        assert_eq!(part.nav_type, bookstruct_shared::NavType::Part);
        assert_eq!(part.ordinal, Some(1));
        assert_eq!(part.children[0].nav_type, bookstruct_shared::NavType::Chapter);
        assert_eq!(part.children[0].href, "OEBPS/Text/chapter-1.xhtml");
        assert_eq!(model.navigation[1].nav_type, bookstruct_shared::NavType::BackMatter);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let dir = sample_package();
        let parallel = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");
        let sequential_config = EngineConfig {
            parallel: false,
            ..EngineConfig::default()
        };
        let sequential = analyze_package(dir.path(), &sequential_config, &SilentProgress).expect("analyze");

        let paths = |m: &DocumentModel| m.documents.iter().map(|d| d.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&parallel), paths(&sequential));
        assert_eq!(parallel.section_count(), sequential.section_count());
    }

    #[test]
    fn unreadable_document_yields_empty_sections() {
        let dir = sample_package();
        fs::remove_file(dir.path().join("OEBPS/Text/appendix-a.xhtml")).expect("remove");
        let model = analyze_package(dir.path(), &EngineConfig::default(), &SilentProgress).expect("analyze");

        let appendix = model.document("OEBPS/Text/appendix-a.xhtml").expect("appendix");
        assert!(appendix.sections.is_empty());
        assert!(appendix.content_hash.is_empty());
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = analyze_package(&dir.path().join("missing"), &EngineConfig::default(), &SilentProgress);
        assert!(result.is_err());
    }

    struct Recording(Mutex<Vec<String>>);

    impl ProgressReporter for Recording {
        fn phase(&self, name: &str) {
            self.0.lock().expect("lock").push(name.to_string());
        }
        fn document_done(&self, _path: &str, _current: usize, _total: usize) {}
        fn done(&self, _model: &DocumentModel) {
            self.0.lock().expect("lock").push("done".to_string());
        }
    }

    #[test]
    fn reports_phases_in_order() {
        let dir = sample_package();
        let recorder = Recording(Mutex::new(Vec::new()));
        analyze_package(dir.path(), &EngineConfig::default(), &recorder).expect("analyze");

        let phases = recorder.0.lock().expect("lock").clone();
        assert_eq!(phases.first().map(String::as_str), Some("Reading package"));
        assert_eq!(phases.last().map(String::as_str), Some("done"));
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
