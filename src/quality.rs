//! Release quality classification
//!
//! Maps a canonicalized release title (dots already replaced by spaces) to a
//! coarse quality tier, following common scene naming conventions.

use std::fmt;

/// Quality tier of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    Unknown,
    SdTv,
    SdDvd,
    HdTv,
    FullHdTv,
    HdWebDl,
    FullHdWebDl,
    HdBluRay,
    FullHdBluRay,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::Unknown => "Unknown",
            Quality::SdTv => "SD TV",
            Quality::SdDvd => "SD DVD",
            Quality::HdTv => "HD TV",
            Quality::FullHdTv => "1080p HD TV",
            Quality::HdWebDl => "720p WEB-DL",
            Quality::FullHdWebDl => "1080p WEB-DL",
            Quality::HdBluRay => "720p BluRay",
            Quality::FullHdBluRay => "1080p BluRay",
        };
        f.write_str(label)
    }
}

/// Decides the quality tier of a release title
pub trait QualityClassifier: Send + Sync {
    fn classify(&self, title: &str) -> Quality;
}

/// Keyword-based classifier for scene release titles
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneQuality;

impl QualityClassifier for SceneQuality {
    fn classify(&self, title: &str) -> Quality {
        let title = title.to_lowercase();
        let words: Vec<&str> = title
            .split(|c: char| c.is_whitespace() || c == '.' || c == '-' || c == '_' || c == '[' || c == ']')
            .filter(|w| !w.is_empty())
            .collect();
        let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(w));

        let hd = has(&["720p"]);
        let full_hd = has(&["1080p", "1080i"]);
        let x264 = has(&["x264", "h264"]);
        let web = has(&["webrip", "webdl"]) || title.contains("web-dl") || title.contains("web dl");
        let bluray = has(&["bluray", "hddvd", "bdrip"]);

        if !hd && !full_hd {
            if has(&["pdtv", "hdtv", "dsr", "tvrip"]) && has(&["xvid", "x264"]) {
                return Quality::SdTv;
            }
            if has(&["dvdrip", "bdrip"]) && has(&["xvid", "divx", "x264"]) {
                return Quality::SdDvd;
            }
            return Quality::Unknown;
        }

        if web {
            return if full_hd { Quality::FullHdWebDl } else { Quality::HdWebDl };
        }
        if bluray && x264 {
            return if full_hd { Quality::FullHdBluRay } else { Quality::HdBluRay };
        }
        if has(&["hdtv"]) && x264 {
            return if full_hd { Quality::FullHdTv } else { Quality::HdTv };
        }

        Quality::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_quality() {
        let q = SceneQuality;
        assert_eq!(q.classify("Show Name S01E02 HDTV XviD-LOL"), Quality::SdTv);
        assert_eq!(q.classify("Show Name S01E02 PDTV x264-2HD"), Quality::SdTv);
        assert_eq!(q.classify("Show Name S01E02 DVDRip XviD-REWARD"), Quality::SdDvd);
        assert_eq!(q.classify("Show Name S01E02 720p HDTV x264-IMMERSE"), Quality::HdTv);
        assert_eq!(q.classify("Show Name S01E02 1080p HDTV x264-ORENJI"), Quality::FullHdTv);
        assert_eq!(q.classify("Show Name S01E02 720p WEB-DL DD5 1 H 264-NTb"), Quality::HdWebDl);
        assert_eq!(q.classify("Show Name S01E02 1080p WEBRip x264"), Quality::FullHdWebDl);
        assert_eq!(q.classify("Show Name S01E02 720p BluRay x264-DEMAND"), Quality::HdBluRay);
        assert_eq!(q.classify("Show Name S01E02 1080p BluRay x264-ROVERS"), Quality::FullHdBluRay);
        assert_eq!(q.classify("Show Name S01E02"), Quality::Unknown);
    }

    #[test]
    fn test_quality_ordering_and_display() {
        assert!(Quality::FullHdBluRay > Quality::HdTv);
        assert!(Quality::SdTv > Quality::Unknown);
        assert_eq!(Quality::HdWebDl.to_string(), "720p WEB-DL");
    }
}
