//! Delivery rate tables.
//!
//! Two-digit postal code prefixes map to a base price (one cubic meter) and a
//! surcharge rate for every additional cubic meter. Four-digit prefixes around
//! the depot in Amersfoort are delivered at one flat amount.
//!
//! Prefixes absent from [`POSTAL_CODE_RATES`] are not served: the Wadden
//! islands (`88`, `89`, `99`) and anything that is not a Dutch postal code.
//! Keep the table sorted by prefix; lookups binary search it.

/// Rate for one two-digit postal code prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostalCodeRate {
    /// First two digits of the postal code.
    pub prefix: &'static str,
    /// Price in euros for a single volume unit.
    pub base_price: f64,
    /// Cost of the first additional unit, as a fraction of `base_price`.
    pub surcharge_rate: f64,
}

const fn rate(prefix: &'static str, base_price: f64, surcharge_rate: f64) -> PostalCodeRate {
    PostalCodeRate {
        prefix,
        base_price,
        surcharge_rate,
    }
}

/// Flat delivery price for the fixed-rate zone.
pub const FLAT_RATE_AMOUNT: f64 = 45.00;

/// Each additional volume unit costs this fraction of the previous one.
pub const SURCHARGE_DECAY: f64 = 0.90;

/// Four-digit prefixes delivered at [`FLAT_RATE_AMOUNT`] regardless of volume.
pub const FIXED_RATE_PREFIXES: &[&str] = &[
    // Amersfoort
    "3811", "3812", "3813", "3814", "3815", "3816", "3817", "3818", "3819", "3821", "3822",
    "3823", "3824", "3825", "3826", "3829",
    // Hoogland
    "3828",
    // Leusden
    "3831", "3832", "3833",
    // Soest
    "3761", "3762", "3763", "3764", "3766", "3768", "3769",
];

/// Two-digit prefix rates, sorted by prefix.
pub const POSTAL_CODE_RATES: &[PostalCodeRate] = &[
    // Amsterdam, Zaanstreek, Waterland
    rate("10", 69.00, 0.20),
    rate("11", 69.00, 0.20),
    rate("12", 65.00, 0.20),
    rate("13", 69.00, 0.20),
    rate("14", 72.00, 0.20),
    rate("15", 72.00, 0.20),
    // Noord-Holland Noord
    rate("16", 79.00, 0.20),
    rate("17", 85.00, 0.20),
    rate("18", 79.00, 0.20),
    rate("19", 75.00, 0.20),
    // Haarlem, Bollenstreek, Leiden
    rate("20", 72.00, 0.20),
    rate("21", 72.00, 0.20),
    rate("22", 75.00, 0.20),
    rate("23", 75.00, 0.20),
    rate("24", 72.00, 0.20),
    // Den Haag, Delft, Westland
    rate("25", 79.00, 0.20),
    rate("26", 79.00, 0.20),
    rate("27", 75.00, 0.20),
    rate("28", 72.00, 0.20),
    rate("29", 79.00, 0.20),
    // Rotterdam, Voorne-Putten, Goeree
    rate("30", 79.00, 0.20),
    rate("31", 79.00, 0.20),
    rate("32", 85.00, 0.20),
    // Dordrecht, Gorinchem
    rate("33", 75.00, 0.20),
    rate("34", 65.00, 0.15),
    // Utrecht, Gooi
    rate("35", 59.00, 0.15),
    rate("36", 59.00, 0.15),
    // Depot region: no volume surcharge
    rate("37", 55.00, 0.00),
    rate("38", 55.00, 0.00),
    rate("39", 55.00, 0.00),
    // Veluwe, Rivierenland
    rate("40", 65.00, 0.15),
    rate("41", 65.00, 0.15),
    rate("42", 69.00, 0.15),
    // Zeeland
    rate("43", 95.00, 0.25),
    rate("44", 95.00, 0.25),
    rate("45", 99.00, 0.25),
    rate("46", 89.00, 0.25),
    // West-Brabant
    rate("47", 85.00, 0.20),
    rate("48", 79.00, 0.20),
    rate("49", 79.00, 0.20),
    // Midden- en Oost-Brabant
    rate("50", 75.00, 0.20),
    rate("51", 75.00, 0.20),
    rate("52", 72.00, 0.20),
    rate("53", 72.00, 0.20),
    rate("54", 75.00, 0.20),
    rate("55", 79.00, 0.20),
    rate("56", 79.00, 0.20),
    rate("57", 79.00, 0.20),
    // Limburg
    rate("58", 89.00, 0.25),
    rate("59", 89.00, 0.25),
    rate("60", 95.00, 0.25),
    rate("61", 95.00, 0.25),
    rate("62", 99.00, 0.25),
    rate("63", 99.00, 0.25),
    rate("64", 99.00, 0.25),
    // Nijmegen, Arnhem
    rate("65", 69.00, 0.15),
    rate("66", 65.00, 0.15),
    rate("67", 59.00, 0.15),
    rate("68", 65.00, 0.15),
    rate("69", 69.00, 0.15),
    // Achterhoek, Twente, Salland
    rate("70", 75.00, 0.20),
    rate("71", 79.00, 0.20),
    rate("72", 72.00, 0.20),
    rate("73", 65.00, 0.15),
    rate("74", 75.00, 0.20),
    rate("75", 85.00, 0.20),
    rate("76", 85.00, 0.20),
    // Drenthe
    rate("77", 85.00, 0.20),
    rate("78", 89.00, 0.20),
    rate("79", 85.00, 0.20),
    // Zwolle, Flevoland
    rate("80", 69.00, 0.15),
    rate("81", 72.00, 0.15),
    rate("82", 69.00, 0.15),
    rate("83", 75.00, 0.15),
    // Friesland
    rate("84", 89.00, 0.25),
    rate("85", 89.00, 0.25),
    rate("86", 89.00, 0.25),
    rate("87", 95.00, 0.25),
    // Noord-Friesland, Groningen
    rate("90", 89.00, 0.25),
    rate("91", 95.00, 0.25),
    rate("92", 89.00, 0.25),
    rate("93", 85.00, 0.25),
    rate("94", 85.00, 0.25),
    rate("95", 89.00, 0.25),
    rate("96", 89.00, 0.25),
    rate("97", 85.00, 0.25),
    rate("98", 89.00, 0.25),
];
