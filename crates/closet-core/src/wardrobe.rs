//! Wardrobe domain types.
//!
//! Records come in two forms. A *headless* record ([`ClothingRecord`],
//! [`StyleRecord`]) is what the database hands back: it knows which
//! [`ImageKey`]s it needs but carries no image bytes. A *hydrated* record
//! ([`Clothing`], [`Style`]) has every image field filled with an
//! [`ImageSlot`], which is either the loaded payload or an explicit
//! `Missing` marker.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ids::{ClothingId, ImageKey, StyleId};
use crate::Error;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The slot a clothing item occupies in a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Outer,
    Shoes,
    Bag,
    Accessory,
}

impl Category {
    /// Every category, in slot order.
    pub const ALL: [Category; 6] = [
        Category::Top,
        Category::Bottom,
        Category::Outer,
        Category::Shoes,
        Category::Bag,
        Category::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Outer => "outer",
            Self::Shoes => "shoes",
            Self::Bag => "bag",
            Self::Accessory => "accessory",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown category: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Image payloads
// ---------------------------------------------------------------------------

/// An encoded bitmap (PNG, JPEG, ...) treated as an opaque blob.
///
/// Cloning is cheap and never copies the bytes; the payload is immutable.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData(Bytes);

impl ImageData {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Size of the encoded payload, used for cache byte accounting.
    pub fn size_bytes(&self) -> u64 {
        self.0.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImageData {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<Bytes> for ImageData {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl From<&'static [u8]> for ImageData {
    fn from(b: &'static [u8]) -> Self {
        Self(Bytes::from_static(b))
    }
}

/// A hydrated image field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    Loaded(ImageData),
    /// The image could not be resolved from the cache or the disk store.
    Missing,
}

impl ImageSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn image(&self) -> Option<&ImageData> {
        match self {
            Self::Loaded(data) => Some(data),
            Self::Missing => None,
        }
    }
}

impl From<Option<ImageData>> for ImageSlot {
    fn from(opt: Option<ImageData>) -> Self {
        opt.map_or(Self::Missing, Self::Loaded)
    }
}

// ---------------------------------------------------------------------------
// Clothing
// ---------------------------------------------------------------------------

/// A clothing item as persisted, without its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingRecord {
    pub id: ClothingId,
    pub image_key: ImageKey,
    pub category: Category,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A clothing item with its image attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clothing {
    pub id: ClothingId,
    pub image_key: ImageKey,
    pub category: Category,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub image: ImageSlot,
}

impl Clothing {
    /// Create a brand-new item with fresh ids.
    pub fn new(category: Category, name: impl Into<String>, image: ImageData) -> Self {
        Self {
            id: ClothingId::new(),
            image_key: ImageKey::new(),
            category,
            name: name.into(),
            created_at: Utc::now(),
            image: ImageSlot::Loaded(image),
        }
    }

    pub fn from_record(record: ClothingRecord, image: ImageSlot) -> Self {
        Self {
            id: record.id,
            image_key: record.image_key,
            category: record.category,
            name: record.name,
            created_at: record.created_at,
            image,
        }
    }

    /// Strip the image, producing the form the database stores.
    pub fn to_record(&self) -> ClothingRecord {
        ClothingRecord {
            id: self.id,
            image_key: self.image_key,
            category: self.category,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// A style as persisted: one clothing record per occupied category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub id: StyleId,
    pub name: String,
    pub slots: BTreeMap<Category, ClothingRecord>,
    pub created_at: DateTime<Utc>,
}

impl StyleRecord {
    /// Image keys of every occupied slot, in category order.
    pub fn image_keys(&self) -> Vec<ImageKey> {
        self.slots.values().map(|c| c.image_key).collect()
    }
}

/// A style with every slot's clothing hydrated.
///
/// Slots are only reachable through [`Style::put`] and friends, which keep
/// every slot keyed by its clothing's own category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub id: StyleId,
    pub name: String,
    slots: BTreeMap<Category, Clothing>,
    pub created_at: DateTime<Utc>,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StyleId::new(),
            name: name.into(),
            slots: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stored style from its parts.
    pub fn restore(
        id: StyleId,
        name: String,
        created_at: DateTime<Utc>,
        clothing: impl IntoIterator<Item = Clothing>,
    ) -> Self {
        let mut style = Self {
            id,
            name,
            slots: BTreeMap::new(),
            created_at,
        };
        for item in clothing {
            style.put(item);
        }
        style
    }

    pub fn slots(&self) -> &BTreeMap<Category, Clothing> {
        &self.slots
    }

    pub fn slot(&self, category: Category) -> Option<&Clothing> {
        self.slots.get(&category)
    }

    /// Place `clothing` in the slot for its category, returning whatever
    /// previously occupied that slot.
    pub fn put(&mut self, clothing: Clothing) -> Option<Clothing> {
        self.slots.insert(clothing.category, clothing)
    }

    /// Builder-style variant of [`Style::put`].
    pub fn with(mut self, clothing: Clothing) -> Self {
        self.put(clothing);
        self
    }

    /// Categories whose clothing has no loaded image.
    pub fn missing_slots(&self) -> Vec<Category> {
        self.slots
            .iter()
            .filter(|(_, c)| !c.image.is_loaded())
            .map(|(cat, _)| *cat)
            .collect()
    }

    pub fn to_record(&self) -> StyleRecord {
        StyleRecord {
            id: self.id,
            name: self.name.clone(),
            slots: self
                .slots
                .iter()
                .map(|(cat, c)| (*cat, c.to_record()))
                .collect(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display_and_parse() {
        for cat in Category::ALL {
            let parsed: Category = cat.to_string().parse().unwrap();
            assert_eq!(parsed, cat);
        }
        assert_eq!("SHOES".parse::<Category>().unwrap(), Category::Shoes);
        assert!("hat".parse::<Category>().is_err());
    }

    #[test]
    fn image_data_size_and_debug() {
        let data = ImageData::from(vec![1u8, 2, 3]);
        assert_eq!(data.size_bytes(), 3);
        assert_eq!(format!("{data:?}"), "ImageData(3 bytes)");
    }

    #[test]
    fn image_slot_from_option() {
        assert_eq!(ImageSlot::from(None), ImageSlot::Missing);
        let slot = ImageSlot::from(Some(ImageData::from(&b"png"[..])));
        assert!(slot.is_loaded());
        assert_eq!(slot.image().unwrap().as_bytes(), b"png");
    }

    #[test]
    fn clothing_record_roundtrip() {
        let c = Clothing::new(Category::Top, "white tee", ImageData::from(&b"x"[..]));
        let record = c.to_record();
        let back = Clothing::from_record(record, c.image.clone());
        assert_eq!(back, c);
    }

    #[test]
    fn style_keeps_one_item_per_category() {
        let first = Clothing::new(Category::Shoes, "sneakers", ImageData::from(&b"a"[..]));
        let second = Clothing::new(Category::Shoes, "boots", ImageData::from(&b"b"[..]));
        let mut style = Style::new("weekend");
        assert!(style.put(first.clone()).is_none());
        let replaced = style.put(second.clone()).unwrap();
        assert_eq!(replaced.id, first.id);
        assert_eq!(style.slots().len(), 1);
        assert_eq!(style.slot(Category::Shoes).unwrap().id, second.id);
        assert!(style.slot(Category::Top).is_none());
    }

    #[test]
    fn restore_keys_slots_by_clothing_category() {
        let top = Clothing::new(Category::Top, "shirt", ImageData::from(&b"t"[..]));
        let bag = Clothing::new(Category::Bag, "tote", ImageData::from(&b"b"[..]));
        let original = Style::new("office").with(top.clone()).with(bag.clone());

        let restored = Style::restore(
            original.id,
            original.name.clone(),
            original.created_at,
            [bag, top.clone()],
        );
        assert_eq!(restored, original);
        assert_eq!(restored.slot(Category::Top), Some(&top));
    }

    #[test]
    fn style_record_keys_follow_category_order() {
        let top = Clothing::new(Category::Top, "shirt", ImageData::from(&b"t"[..]));
        let bag = Clothing::new(Category::Bag, "tote", ImageData::from(&b"b"[..]));
        let style = Style::new("office").with(bag.clone()).with(top.clone());
        assert_eq!(
            style.to_record().image_keys(),
            vec![top.image_key, bag.image_key]
        );
    }

    #[test]
    fn missing_slots_lists_unloaded() {
        let mut top = Clothing::new(Category::Top, "shirt", ImageData::from(&b"t"[..]));
        top.image = ImageSlot::Missing;
        let bottom = Clothing::new(Category::Bottom, "jeans", ImageData::from(&b"j"[..]));
        let style = Style::new("casual").with(top).with(bottom);
        assert_eq!(style.missing_slots(), vec![Category::Top]);
    }
}
