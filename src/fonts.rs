//! Font catalog: key → display name, conversion endpoint, CSS font family.
//!
//! Extracted from the JavaScript bundle of fontconverter.online. Several
//! keys share one endpoint because the service groups related typefaces
//! behind a single conversion route; the `family` string is what a caller
//! would apply to rendered output and is opaque to the pipeline.
//!
//! Unknown keys are a hard [`GujConvError::UnknownFont`] — never a silent
//! default. A silently substituted font produces output that *looks*
//! converted but renders as garbage under the font the user actually meant.

use crate::error::GujConvError;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontInfo {
    /// Catalog key, e.g. `"shree0768"`.
    pub key: &'static str,
    /// Human-readable name, e.g. `"Shree-Guj-0768"`.
    pub name: &'static str,
    /// Conversion endpoint URL (POST target).
    pub endpoint: &'static str,
    /// CSS `font-family` value for rendering the converted text.
    pub family: &'static str,
}

macro_rules! font {
    ($key:literal, $name:literal, $route:literal, $family:literal) => {
        FontInfo {
            key: $key,
            name: $name,
            endpoint: concat!("https://www.fontconverter.online/gujarati/", $route),
            family: $family,
        }
    };
}

/// Every font the remote service supports, in catalog order.
pub static GUJARATI_FONTS: &[FontInfo] = &[
    font!("gopika", "Gopika", "GetModifiedText", "B Bharati GopikaTwo"),
    font!("TitleTwo", "Title Two", "GetModifiedText", "\"TitleTwo\", \"B Bharati GopikaTwo\""),
    font!("avantika", "Avantika", "GetAvantikaText", "GJ-TTAvantika"),
    font!("shree0768", "Shree-Guj-0768", "GetShree0768Text", "\"Shree-Guj-0768\", \"Shree-Guj-0768W\""),
    font!("shree0763", "Shree-Guj-0763", "GetShree0768Text", "\"Shree-Guj-0763\""),
    font!("shree0752", "Shree 752", "GetShree0768Text", "\"SHREE752\""),
    font!("shree0769", "Shree-Guj-0769", "GetShree0768Text", "\"Shree-Guj7-0769\""),
    font!("shree1120", "Shree 1120", "GetShree0768Text", "\"Shree-Guj-0768\", \"Shree-Guj-0763\", \"Shree-Guj-0768W\", \"Shree-Guj7-0769\""),
    font!("LmgArun", "LMG Arun", "GetLmgArunText", "\"LMG-Arun\", \"LMG-Laxmi\", \"LMG-Manoj\", \"LMG-Paras\", \"LMG-Rupen\""),
    font!("LmgManoj", "LMG Manoj", "GetLmgArunText", "\"LMG-Manoj\", \"LMG-Arun\", \"LMG-Laxmi\", \"LMG-Paras\", \"LMG-Rupen\""),
    font!("LmgRupen", "LMG Rupen", "GetLmgArunText", "\"LMG-Rupen\", \"LMG-Manoj\", \"LMG-Arun\", \"LMG-Laxmi\", \"LMG-Paras\""),
    font!("LmgParas", "LMG Paras", "GetLmgArunText", "\"LMG-Paras\", \"LMG-Arun\", \"LMG-Laxmi\", \"LMG-Manoj\", \"LMG-Rupen\""),
    font!("krishna", "Krishna", "GetKrishnaText", "krishna"),
    font!("krishnaV1", "Krishna V1", "GetKrishnaV1Text", "krishna"),
    font!("kap127", "KAP 127", "GetKap127Text", "KAP127"),
    font!("saral", "Saral", "GetSaralText", "Gujrati Saral-2"),
    font!("shyama", "Shyama", "GetShyamaText", "\"AkrutiGujShyama\", \"AkrutiGujShyamaNormal\""),
    font!("EKLG17", "EKLG-17", "GetEKLGText", "\"EKLG-17\", \"eklg-17\", \"EKLG-20\", \"EKLG-13\", \"EKLG-13B\", \"eklg-10\""),
    font!("EKLG10", "EKLG-10", "GetEKLGText", "\"eklg-10\", \"EKLG-13\", \"EKLG-20\", \"EKLG-13B\", \"eklg-17\""),
    font!("ghanshyam", "Ghanshyam", "GetHariText", "\"Ghanshyam\", \"Hari\", \"Harikrishna\""),
    font!("Amrut", "Amrut", "GetHariText", "\"Amrut\""),
    font!("Hari", "Hari", "GetHariText", "\"Hari\", \"Ghanshyam\", \"Harikrishna\""),
    font!("HariKrishna", "Hari Krishna", "GetHariText", "\"Harikrishna\", \"Ghanshyam\", \"Hari\""),
    font!("Nilkanth", "Nilkanth", "GetHariText", "\"NILKANTH\", \"Nilkanth\", \"Ghanshyam\", \"Hari\", \"Harikrishna\""),
    font!("Yogi", "Yogi", "GetHariText", "\"Yogi\", \"Ghanshyam\", \"Hari\", \"Harikrishna\""),
    font!("terafontKinnari", "Terafont Kinnari", "GetTeraKinnariText", "\"TERAFONT-KINNARI\", \"TERAFONT-Kinnari\""),
    font!("terafontVarun", "Terafont Varun", "GetTeraVarunText", "\"TERAFONT-VARUN\", \"TERAFONT-AAKASH\", \"TERAFONT-CHANDAN\", \"TERAFONT-TRILOCHAN\""),
    font!("terafontTrilochan", "Terafont Trilochan", "GetTeraVarunText", "\"TERAFONT-TRILOCHAN\", \"TERAFONT-VARUN\", \"TERAFONT-AAKASH\", \"TERAFONT-CHANDAN\", \"TERAFONT-KINNARI\""),
    font!("terafontChandan", "Terafont Chandan", "GetTeraVarunText", "\"TERAFONT-CHANDAN\", \"TERAFONT-TRILOCHAN\", \"TERAFONT-VARUN\", \"TERAFONT-AAKASH\""),
    font!("terafontAkash", "Terafont Akash", "GetTeraVarunText", "\"TERAFONT-AAKASH\", \"TERAFONT-CHANDAN\", \"TERAFONT-TRILOCHAN\", \"TERAFONT-VARUN\""),
    font!("gopikatwo2", "Gopika Two", "GetModifiedText", "\"GopikaTwo\""),
    font!("gopikaeng", "Gopika English", "GetModifiedText", "\"GopikaEnglish\", \"G_GopikaEnglish\""),
    font!("vakil", "Vakil", "GetModifiedText", "\"Vakil_01\""),
    font!("sulekh", "Sulekh", "GetModifiedText", "\"Guj_Simple_Normal_SULEKH\""),
    font!("GujratiLys", "Gujarati Lys", "GetModifiedText", "\"GujratiLys 020 Wide\", \"GujratiLys 010\""),
];

static BY_KEY: Lazy<BTreeMap<&'static str, &'static FontInfo>> =
    Lazy::new(|| GUJARATI_FONTS.iter().map(|f| (f.key, f)).collect());

/// Look up a font by catalog key.
///
/// # Errors
/// [`GujConvError::UnknownFont`] when the key is not in the catalog.
pub fn font_info(key: &str) -> Result<&'static FontInfo, GujConvError> {
    BY_KEY
        .get(key)
        .copied()
        .ok_or_else(|| GujConvError::UnknownFont { key: key.to_string() })
}

/// All `(key, display name)` pairs for listings, in catalog order.
pub fn font_list() -> impl Iterator<Item = (&'static str, &'static str)> {
    GUJARATI_FONTS.iter().map(|f| (f.key, f.name))
}
