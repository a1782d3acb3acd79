//! Cover image resolution.

use bookstruct_classify::classify_image;
use bookstruct_shared::paths::strip_fragment;
use bookstruct_shared::{CoverImage, CoverSource, ImageKind, ImageSet, ManifestEntry};

/// Pick the cover image of a package.
///
/// Declarations win over guesses: the EPUB 3 `cover-image` property, then
/// the EPUB 2 cover meta, then an image named like a cover, then the first
/// image in path order.
pub fn resolve_cover(
    manifest: &[ManifestEntry],
    meta_cover_id: Option<&str>,
    images: &ImageSet,
) -> Option<CoverImage> {
    let declared = |entry: &ManifestEntry, source| CoverImage {
        path: strip_fragment(&entry.href).to_string(),
        source,
    };

    if let Some(entry) = manifest.iter().find(|e| e.has_property("cover-image")) {
        return Some(declared(entry, CoverSource::ManifestProperty));
    }

    // EPUB 2 metas sometimes name the cover page instead of its image.
    if let Some(entry) = meta_cover_id.and_then(|id| manifest.iter().find(|e| e.id == id && e.is_image())) {
        return Some(declared(entry, CoverSource::MetaCover));
    }

    let sorted = images.sorted();
    let id_of = |path: &str| {
        manifest
            .iter()
            .find(|e| strip_fragment(&e.href) == path)
            .map(|e| e.id.as_str())
            .unwrap_or_default()
    };

    if let Some(path) = sorted
        .iter()
        .copied()
        .find(|&path| classify_image(path, id_of(path)) == ImageKind::Cover)
    {
        return Some(CoverImage {
            path: path.to_string(),
            source: CoverSource::FileName,
        });
    }

    sorted.first().map(|path| CoverImage {
        path: path.to_string(),
        source: CoverSource::FirstImage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, href: &str, properties: Option<&str>) -> ManifestEntry {
        ManifestEntry {
            id: id.into(),
            href: href.into(),
            media_type: "image/jpeg".into(),
            properties: properties.map(String::from),
        }
    }

    fn images() -> ImageSet {
        ["OEBPS/a.jpg", "OEBPS/front.jpg", "OEBPS/z-cover.jpg"].into_iter().collect()
    }

    #[test]
    fn manifest_property_first() {
        let manifest = vec![
            item("img1", "OEBPS/a.jpg", None),
            item("front", "OEBPS/front.jpg", Some("cover-image")),
        ];
        let cover = resolve_cover(&manifest, Some("img1"), &images()).expect("cover");
        assert_eq!(cover.path, "OEBPS/front.jpg");
        assert_eq!(cover.source, CoverSource::ManifestProperty);
    }

    #[test]
    fn meta_cover_second() {
        let manifest = vec![item("img1", "OEBPS/a.jpg", None)];
        let cover = resolve_cover(&manifest, Some("img1"), &images()).expect("cover");
        assert_eq!(cover.path, "OEBPS/a.jpg");
        assert_eq!(cover.source, CoverSource::MetaCover);
    }

    #[test]
    fn meta_cover_naming_a_page_is_ignored() {
        let page = ManifestEntry {
            media_type: "application/xhtml+xml".into(),
            ..item("cover", "OEBPS/cover.xhtml", None)
        };
        let cover = resolve_cover(&[page], Some("cover"), &images()).expect("cover");
        assert_eq!(cover.path, "OEBPS/z-cover.jpg");
        assert_eq!(cover.source, CoverSource::FileName);
    }

    #[test]
    fn file_name_then_first_image() {
        let cover = resolve_cover(&[], Some("missing"), &images()).expect("cover");
        assert_eq!(cover.path, "OEBPS/z-cover.jpg");
        assert_eq!(cover.source, CoverSource::FileName);

        let manifest = vec![item("cover-art", "OEBPS/front.jpg", None)];
        let plain: ImageSet = ["OEBPS/b.png", "OEBPS/front.jpg"].into_iter().collect();
        let cover = resolve_cover(&manifest, None, &plain).expect("cover");
        assert_eq!(cover.path, "OEBPS/front.jpg");
        assert_eq!(cover.source, CoverSource::FileName);

        let plain: ImageSet = ["OEBPS/b.png", "OEBPS/a.png"].into_iter().collect();
        let cover = resolve_cover(&[], None, &plain).expect("cover");
        assert_eq!(cover.path, "OEBPS/a.png");
        assert_eq!(cover.source, CoverSource::FirstImage);
    }

    #[test]
    fn no_images_no_cover() {
        assert_eq!(resolve_cover(&[], None, &ImageSet::default()), None);
    }
}
