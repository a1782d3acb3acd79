//! Loading of unpacked e-book packages.
//!
//! Reads the container file, the OPF package document, the navigation
//! document (EPUB 3 nav or EPUB 2 NCX) and takes an inventory of the files on
//! disk. Only an unusable root directory is an error: every other problem is
//! logged and degrades to an empty result.

pub mod container;
pub mod cover;
pub mod discover;
pub mod nav;
pub mod ncx;
pub mod opf;
mod xml;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use bookstruct_shared::paths::{normalize_path, parent_dir, strip_fragment};
use bookstruct_shared::{
    BookStructError, CoverImage, EngineConfig, ImageSet, ManifestEntry, NavEntry, Result,
    SpineItem,
};

pub use container::{CONTAINER_PATH, parse_container_xml};
pub use cover::resolve_cover;
pub use discover::{Inventory, discover_documents, discover_images, scan};
pub use nav::parse_nav_document;
pub use ncx::parse_ncx;
pub use opf::{OpfDocument, parse_opf};

// ---------------------------------------------------------------------------
// Package
// ---------------------------------------------------------------------------

/// An unpacked package on disk, with its package documents parsed.
#[derive(Debug, Clone)]
pub struct Package {
    root: PathBuf,
    opf_path: Option<String>,
    opf: OpfDocument,
    navigation: Vec<NavEntry>,
    inventory: Inventory,
}

impl Package {
    /// Open the package rooted at `root`.
    ///
    /// Fails only when `root` is missing or not a directory.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>, config: &EngineConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let inventory = discover::scan(&root, &config.image_extensions, &config.skip_dirs)?;

        let opf_path = locate_opf(&root, &inventory);
        let opf = match &opf_path {
            Some(path) => load_opf(&root, path),
            None => {
                warn!("no package document found");
                OpfDocument::default()
            }
        };

        let mut package = Self {
            root,
            opf_path,
            opf,
            navigation: Vec::new(),
            inventory,
        };
        package.navigation = package.load_navigation();

        debug!(
            manifest = package.opf.manifest.len(),
            spine = package.opf.spine.len(),
            nav_entries = package.navigation.len(),
            images = package.inventory.images.len(),
            "opened package"
        );
        Ok(package)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Package-relative path of the OPF document, if one was found.
    pub fn opf_path(&self) -> Option<&str> {
        self.opf_path.as_deref()
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.opf.manifest
    }

    pub fn spine(&self) -> &[SpineItem] {
        &self.opf.spine
    }

    /// Raw table-of-contents entries.
    pub fn navigation(&self) -> &[NavEntry] {
        &self.navigation
    }

    /// Frozen set of image files in the package.
    pub fn images(&self) -> &ImageSet {
        &self.inventory.images
    }

    /// Markup documents found on disk, sorted.
    pub fn documents(&self) -> &[String] {
        &self.inventory.documents
    }

    pub fn manifest_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.opf.entry(id)
    }

    /// Markup documents in reading order.
    ///
    /// Follows the spine, with `linear="no"` items after the linear ones;
    /// without a spine, the manifest's markup entries in declaration order;
    /// without a manifest, the documents on disk.
    pub fn reading_order(&self) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let (linear, auxiliary): (Vec<&SpineItem>, Vec<&SpineItem>) =
            self.opf.spine.iter().partition(|item| item.linear);
        let mut order: Vec<String> = linear
            .into_iter()
            .chain(auxiliary)
            .filter_map(|item| self.opf.entry(&item.idref))
            .filter(|e| e.is_markup())
            .map(|e| strip_fragment(&e.href).to_string())
            .filter(|href| seen.insert(href.clone()))
            .collect();

        if order.is_empty() {
            order = self
                .opf
                .manifest
                .iter()
                .filter(|e| e.is_markup())
                .map(|e| strip_fragment(&e.href).to_string())
                .filter(|href| seen.insert(href.clone()))
                .collect();
        }

        if order.is_empty() {
            order = self.inventory.documents.clone();
        }
        order
    }

    /// Every markup document of the package, each once.
    ///
    /// The reading order comes first, then manifest markup entries outside
    /// it, then markup files on disk the manifest never declares.
    pub fn content_documents(&self) -> Vec<String> {
        let mut documents = self.reading_order();
        let mut seen: HashSet<String> = documents.iter().cloned().collect();

        let declared = self
            .opf
            .manifest
            .iter()
            .filter(|e| e.is_markup())
            .map(|e| strip_fragment(&e.href).to_string());
        let on_disk = self.inventory.documents.iter().cloned();

        for path in declared.chain(on_disk) {
            if seen.insert(path.clone()) {
                documents.push(path);
            }
        }
        documents
    }

    /// Read a package-relative file as text.
    pub fn read_document(&self, rel: &str) -> Result<String> {
        let path = self.root.join(normalize_path(rel));
        let bytes = std::fs::read(&path).map_err(|e| BookStructError::io(&path, e))?;
        Ok(xml::decode_text(&bytes))
    }

    /// Cover image, declared or guessed.
    pub fn cover(&self) -> Option<CoverImage> {
        resolve_cover(
            &self.opf.manifest,
            self.opf.meta_cover_id.as_deref(),
            &self.inventory.images,
        )
    }

    /// EPUB 3 nav document first, then the NCX.
    fn load_navigation(&self) -> Vec<NavEntry> {
        if let Some(entry) = self.opf.nav_entry() {
            let href = strip_fragment(&entry.href);
            match self.read_document(href) {
                Ok(markup) => {
                    let entries = parse_nav_document(&markup, &parent_dir(href));
                    if !entries.is_empty() {
                        return entries;
                    }
                    debug!(%href, "navigation document has no toc entries");
                }
                Err(e) => warn!(error = %e, "unreadable navigation document"),
            }
        }

        if let Some(entry) = self.opf.ncx_entry() {
            let href = strip_fragment(&entry.href);
            match self.read_document(href) {
                Ok(content) => match parse_ncx(&content, &parent_dir(href)) {
                    Ok(entries) => return entries,
                    Err(e) => warn!(error = %e, %href, "unparseable NCX"),
                },
                Err(e) => warn!(error = %e, "unreadable NCX"),
            }
        }

        Vec::new()
    }
}

/// The OPF named by `container.xml`, else the first `*.opf` on disk.
fn locate_opf(root: &Path, inventory: &Inventory) -> Option<String> {
    let container = root.join(CONTAINER_PATH);
    match std::fs::read(&container) {
        Ok(bytes) => match parse_container_xml(&bytes) {
            Ok(path) => {
                let path = normalize_path(&path);
                if root.join(&path).is_file() {
                    return Some(path);
                }
                warn!(%path, "container points at a missing package document");
            }
            Err(e) => warn!(error = %e, "unparseable container.xml"),
        },
        Err(e) => debug!(error = %e, "no container.xml"),
    }

    inventory.package_documents.first().cloned()
}

fn load_opf(root: &Path, opf_path: &str) -> OpfDocument {
    let path = root.join(opf_path);
    let content = match std::fs::read(&path) {
        Ok(bytes) => xml::decode_text(&bytes),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "unreadable package document");
            return OpfDocument::default();
        }
    };

    match parse_opf(&content, &parent_dir(opf_path)) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, %opf_path, "unparseable package document");
            OpfDocument::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata><meta name="cover" content="cover"/></metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="cover" href="images/front.jpg" media-type="image/jpeg"/>
    <item id="ch02" href="text/ch02.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch01" href="text/ch01.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx"><itemref idref="ch01"/><itemref idref="ch02"/></spine>
</package>"#;

    const NCX: &str = r#"<ncx><navMap>
  <navPoint><navLabel><text>Chapter 1</text></navLabel><content src="text/ch01.xhtml"/></navPoint>
</navMap></ncx>"#;

    fn sample_package() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "mimetype", "application/epub+zip");
        write(dir.path(), "META-INF/container.xml", CONTAINER);
        write(dir.path(), "OEBPS/content.opf", OPF);
        write(dir.path(), "OEBPS/toc.ncx", NCX);
        write(dir.path(), "OEBPS/images/front.jpg", "jpg");
        write(dir.path(), "OEBPS/text/ch01.xhtml", "<html><body><h1>One</h1></body></html>");
        write(dir.path(), "OEBPS/text/ch02.xhtml", "<html><body><h1>Two</h1></body></html>");
        dir
    }

    #[test]
    fn opens_epub2_package() {
        let dir = sample_package();
        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");

        assert_eq!(package.opf_path(), Some("OEBPS/content.opf"));
        assert_eq!(package.manifest().len(), 4);
        assert_eq!(
            package.reading_order(),
            vec!["OEBPS/text/ch01.xhtml", "OEBPS/text/ch02.xhtml"]
        );
        assert_eq!(package.navigation()[0].href, "OEBPS/text/ch01.xhtml");
        assert!(package.images().contains("OEBPS/images/front.jpg"));

        let cover = package.cover().expect("cover");
        assert_eq!(cover.path, "OEBPS/images/front.jpg");
    }

    #[test]
    fn falls_back_to_opf_on_disk() {
        let dir = sample_package();
        fs::remove_file(dir.path().join("META-INF/container.xml")).expect("remove");
        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");
        assert_eq!(package.opf_path(), Some("OEBPS/content.opf"));
    }

    #[test]
    fn broken_opf_degrades_to_documents_on_disk() {
        let dir = sample_package();
        write(dir.path(), "OEBPS/content.opf", "<package><manifest></package>");
        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");

        assert!(package.manifest().is_empty());
        assert!(package.navigation().is_empty());
        assert_eq!(
            package.reading_order(),
            vec!["OEBPS/text/ch01.xhtml", "OEBPS/text/ch02.xhtml"]
        );
    }

    #[test]
    fn non_linear_spine_items_come_last() {
        let dir = sample_package();
        write(
            dir.path(),
            "OEBPS/content.opf",
            &OPF.replace(
                r#"<itemref idref="ch01"/>"#,
                r#"<itemref idref="ch01" linear="no"/>"#,
            ),
        );
        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");
        assert_eq!(
            package.reading_order(),
            vec!["OEBPS/text/ch02.xhtml", "OEBPS/text/ch01.xhtml"]
        );
    }

    #[test]
    fn content_documents_cover_manifest_and_disk() {
        let dir = sample_package();
        write(
            dir.path(),
            "OEBPS/content.opf",
            &OPF.replace(
                "</manifest>",
                r#"<item id="notes" href="text/notes.xhtml" media-type="application/xhtml+xml"/></manifest>"#,
            )
            .replace(r#"<itemref idref="ch02"/>"#, ""),
        );
        write(dir.path(), "OEBPS/text/notes.xhtml", "<html><body><p>n</p></body></html>");
        write(dir.path(), "OEBPS/extra.html", "<html><body><p>e</p></body></html>");

        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");
        assert_eq!(package.reading_order(), vec!["OEBPS/text/ch01.xhtml"]);
        assert_eq!(
            package.content_documents(),
            vec![
                "OEBPS/text/ch01.xhtml",
                "OEBPS/text/ch02.xhtml",
                "OEBPS/text/notes.xhtml",
                "OEBPS/extra.html",
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = Package::open(dir.path().join("absent"), &EngineConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn reads_documents_relative_to_root() {
        let dir = sample_package();
        let package = Package::open(dir.path(), &EngineConfig::default()).expect("open");
        let text = package.read_document("OEBPS/text/../text/ch01.xhtml").expect("read");
        assert!(text.contains("One"));
        assert!(package.read_document("OEBPS/none.xhtml").is_err());
    }
}
