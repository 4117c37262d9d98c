use std::fmt;

use serde::Deserialize;

/// Preview metadata attached to a listing item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Option<Vec<PreviewImage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewImage {
    #[serde(default)]
    pub source: Option<ImageResolution>,
    #[serde(default)]
    pub resolutions: Vec<ImageResolution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageResolution {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ImageResolution {
    fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Ordered image quality scale, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageQuality {
    Low,
    Mid,
    #[default]
    MidHigh,
    High,
}

impl ImageQuality {
    pub const ALL: [Self; 4] = [Self::Low, Self::Mid, Self::MidHigh, Self::High];

    fn level(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Mid => 1,
            Self::MidHigh => 2,
            Self::High => 3,
        }
    }

    /// Position on the scale in `[0, 1]`.
    pub fn fraction(self) -> f64 {
        self.level() as f64 / (Self::ALL.len() - 1) as f64
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::MidHigh => "mid-high",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the image URL matching `quality`, or `None` when the item has no
/// usable image (text posts, keyword thumbnails, missing previews).
pub fn select_image_url(
    preview: Option<&Preview>,
    thumbnail: &str,
    quality: ImageQuality,
) -> Option<String> {
    if !is_http_url(thumbnail) {
        return None;
    }
    let image = preview?.images.as_ref()?.first()?;
    let candidates = candidate_resolutions(image)?;
    let index = candidate_index(candidates.len(), quality);
    candidates.get(index).map(|res| res.url.clone())
}

/// Listed resolutions plus the source image when the last listed entry is
/// not already the full-size one.
fn candidate_resolutions(image: &PreviewImage) -> Option<Vec<&ImageResolution>> {
    let source = image.source.as_ref()?;
    let mut candidates: Vec<&ImageResolution> = image.resolutions.iter().collect();
    let source_listed = candidates
        .last()
        .is_some_and(|last| last.same_size(source));
    if !source_listed {
        candidates.push(source);
    }
    Some(candidates)
}

/// Index into a candidate list of `count` entries for `quality`.
///
/// Dense lists (more than five entries) round to the nearest index, sparse
/// ones floor so the top entry is only hit at the highest level. The result
/// is clamped to the last entry.
pub fn candidate_index(count: usize, quality: ImageQuality) -> usize {
    if count == 0 {
        return 0;
    }
    let raw = quality.fraction() * count as f64;
    let index = if count > 5 { raw.round() } else { raw.floor() };
    (index as usize).min(count - 1)
}

fn is_http_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(url: &str, width: u32, height: u32) -> ImageResolution {
        ImageResolution {
            url: url.to_string(),
            width,
            height,
        }
    }

    fn preview(resolutions: Vec<ImageResolution>, source: ImageResolution) -> Preview {
        Preview {
            images: Some(vec![PreviewImage {
                source: Some(source),
                resolutions,
            }]),
        }
    }

    const THUMB: &str = "https://b.thumbs.example.com/t.jpg";

    #[test]
    fn sparse_list_floors_mid_to_index_one() {
        // two listed + source appended = 3 candidates
        let p = preview(
            vec![res("a", 108, 100), res("b", 216, 200)],
            res("src", 1080, 1000),
        );
        let url = select_image_url(Some(&p), THUMB, ImageQuality::Mid);
        assert_eq!(url.as_deref(), Some("b"));
        assert_eq!(candidate_index(3, ImageQuality::Mid), 1);
    }

    #[test]
    fn dense_list_high_is_clamped_to_last() {
        assert_eq!(candidate_index(8, ImageQuality::High), 7);
        let listed: Vec<_> = (0..7)
            .map(|i| res(&format!("r{i}"), 100 * (i + 1), 100 * (i + 1)))
            .collect();
        let p = preview(listed, res("src", 4000, 4000));
        let url = select_image_url(Some(&p), THUMB, ImageQuality::High);
        assert_eq!(url.as_deref(), Some("src"));
    }

    #[test]
    fn dense_list_rounds() {
        // 2/3 * 8 = 5.33 -> 5
        assert_eq!(candidate_index(8, ImageQuality::MidHigh), 5);
        // 1/3 * 8 = 2.67 -> 3
        assert_eq!(candidate_index(8, ImageQuality::Mid), 3);
    }

    #[test]
    fn source_not_duplicated_when_last_matches() {
        let p = preview(
            vec![res("a", 108, 100), res("full", 640, 480)],
            res("src", 640, 480),
        );
        let url = select_image_url(Some(&p), THUMB, ImageQuality::High);
        assert_eq!(url.as_deref(), Some("full"));
    }

    #[test]
    fn source_only_when_no_resolutions_listed() {
        let p = preview(Vec::new(), res("src", 640, 480));
        for quality in ImageQuality::ALL {
            let url = select_image_url(Some(&p), THUMB, quality);
            assert_eq!(url.as_deref(), Some("src"));
        }
    }

    #[test]
    fn keyword_thumbnail_or_missing_preview_yields_none() {
        assert!(select_image_url(None, "self", ImageQuality::High).is_none());
        let p = preview(vec![res("a", 1, 1)], res("src", 2, 2));
        assert!(select_image_url(Some(&p), "self", ImageQuality::High).is_none());
        assert!(select_image_url(None, THUMB, ImageQuality::High).is_none());
    }

    #[test]
    fn missing_images_or_source_yields_none() {
        let empty = Preview { images: None };
        assert!(select_image_url(Some(&empty), THUMB, ImageQuality::Low).is_none());
        let no_entries = Preview {
            images: Some(Vec::new()),
        };
        assert!(select_image_url(Some(&no_entries), THUMB, ImageQuality::Low).is_none());
        let no_source = Preview {
            images: Some(vec![PreviewImage {
                source: None,
                resolutions: vec![res("a", 1, 1)],
            }]),
        };
        assert!(select_image_url(Some(&no_source), THUMB, ImageQuality::Low).is_none());
    }

    #[test]
    fn index_is_monotonic_in_quality() {
        for count in 1..=12 {
            let indices: Vec<usize> = ImageQuality::ALL
                .iter()
                .map(|q| candidate_index(count, *q))
                .collect();
            assert!(
                indices.windows(2).all(|w| w[0] <= w[1]),
                "count {count}: {indices:?}"
            );
            assert!(indices.iter().all(|i| *i < count));
            assert_eq!(indices[0], 0);
        }
    }
}
