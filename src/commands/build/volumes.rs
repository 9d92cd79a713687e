use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeVariant {
    Standard,
    /// One pre-built book, numbered hadith openings and a closing phrase.
    Final,
}

#[derive(Debug, Clone, Copy)]
pub struct VolumeSpec {
    pub number: u32,
    pub title_en: &'static str,
    pub title_ar: &'static str,
    pub description_en: &'static str,
    pub variant: VolumeVariant,
}

impl VolumeSpec {
    pub fn directory(&self, source_root: &Path) -> PathBuf {
        source_root
            .join("hubeali_com")
            .join(format!("Al-Kafi-Volume-{}", self.number))
    }

    pub fn empty_node(&self) -> Chapter {
        let mut volume = Chapter::internal(PartType::Volume);
        volume.set_title(Language::En, self.title_en);
        volume.set_title(Language::Ar, self.title_ar);
        volume.descriptions = Some(BTreeMap::from([(
            Language::En.as_str().to_string(),
            self.description_en.to_string(),
        )]));
        volume
    }
}

pub const VOLUMES: [VolumeSpec; 8] = [
    VolumeSpec {
        number: 1,
        title_en: "Volume One",
        title_ar: "الجزء الأول\u{200f}",
        description_en: "First volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 2,
        title_en: "Volume Two",
        title_ar: "الجزء الثاني\u{200f}",
        description_en: "Second volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 3,
        title_en: "Volume Three",
        title_ar: "الجزء الثالث\u{200f}",
        description_en: "Third volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 4,
        title_en: "Volume Four",
        title_ar: "الجزء الرابع\u{200f}",
        description_en: "Forth volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 5,
        title_en: "Volume Five",
        title_ar: "الجزء الخامس\u{200f}",
        description_en: "Fifth volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 6,
        title_en: "Volume Six",
        title_ar: "الجزء السادس\u{200f}",
        description_en: "Sixth volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 7,
        title_en: "Volume Seven",
        title_ar: "الجزء السابع\u{200f}",
        description_en: "Seventh volume of Al-Kafi",
        variant: VolumeVariant::Standard,
    },
    VolumeSpec {
        number: 8,
        title_en: "Volume Eight",
        title_ar: "الجزء الثامن\u{200f}",
        description_en: "Eighth volume of Al-Kafi",
        variant: VolumeVariant::Final,
    },
];

pub const ROOT_DESCRIPTION_EN: &str = "Of the majestic narrator and the scholar, the jurist, the Sheykh Muhammad Bin Yaqoub Al-Kulayni Well known as \u{2018}The trustworthy of Al-Islam Al-Kulayni\u{2019} Who died in the year 329 H";

pub fn kafi_root() -> Chapter {
    let mut root = Chapter::internal(PartType::Book);
    root.index = Some(NodeIndex::Key(BOOK_INDEX.to_string()));
    root.path = Some(BOOK_PATH.to_string());
    root.set_title(Language::En, "Al-Kafi");
    root.set_title(Language::Ar, "الكافي");
    root.descriptions = Some(BTreeMap::from([(
        Language::En.as_str().to_string(),
        ROOT_DESCRIPTION_EN.to_string(),
    )]));
    root
}

pub const FINAL_BOOK_TITLE_EN: &str = "The Book - Garden (of Flowers)";
pub const FINAL_BOOK_TITLE_AR: &str =
    "\u{0643}\u{062A}\u{0627}\u{0628} \u{0627}\u{0644}\u{0631}\u{0651}\u{064E}\u{0648}\u{0652}\u{0636}\u{064E}\u{0629}\u{0650}";

pub const DEFAULT_CHAPTER_TITLE_EN: &str = "In the name of Allah, the Beneficent, the Merciful";
pub const DEFAULT_CHAPTER_TITLE_AR: &str = "\u{0628}\u{0650}\u{0633}\u{0652}\u{0645}\u{0650} \u{0627}\u{0644}\u{0644}\u{0651}\u{064E}\u{0647}\u{0650} \u{0627}\u{0644}\u{0631}\u{0651}\u{064E}\u{062D}\u{0652}\u{0645}\u{064E}\u{0646}\u{0650} \u{0627}\u{0644}\u{0631}\u{0651}\u{064E}\u{062D}\u{0650}\u{064A}\u{0645}\u{0650}";

pub const CLOSING_PHRASE: &str = "\u{062A}\u{064E}\u{0645}\u{0651}\u{064E} \u{0643}\u{0650}\u{062A}\u{064E}\u{0627}\u{0628}\u{064F} \u{0627}\u{0644}\u{0631}\u{0651}\u{064E}\u{0648}\u{0652}\u{0636}\u{064E}\u{0629}\u{0650} \u{0645}\u{0650}\u{0646}\u{064E}";

/// Last hadith number of the preceding volume.
pub const FINAL_VOLUME_PREVIOUS_HADITH: u32 = 14449;

pub fn final_volume_book() -> Chapter {
    let mut book = Chapter::internal(PartType::Book);
    book.set_title(Language::Ar, FINAL_BOOK_TITLE_AR);
    book.set_title(Language::En, FINAL_BOOK_TITLE_EN);
    book
}
