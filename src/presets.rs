//! Built-in formula presets for quick testing.
//!
//! Two fixed catalogues: plain molecular formulas and reaction equations
//! using mhchem arrow syntax (conditions above/below the arrow in brackets).

/// A selectable example formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// Stable identifier used by `Action::SelectPreset`
    pub id: &'static str,
    /// Button label
    pub label: &'static str,
    /// Formula text put into the input
    pub formula: &'static str,
}

const fn preset(id: &'static str, label: &'static str, formula: &'static str) -> Preset {
    Preset { id, label, formula }
}

pub static MOLECULAR_FORMULAS: [Preset; 12] = [
    preset("h2so4", "H₂SO₄", "H2SO4"),
    preset("h2o", "H₂O", "H2O"),
    preset("nacl", "NaCl", "NaCl"),
    preset("caco3", "CaCO₃", "CaCO3"),
    preset("hcl", "HCl", "HCl"),
    preset("naoh", "NaOH", "NaOH"),
    preset("kmno4", "KMnO₄", "KMnO4"),
    preset("agno3", "AgNO₃", "AgNO3"),
    preset("ch4", "CH₄", "CH4"),
    preset("co2", "CO₂", "CO2"),
    preset("nh3", "NH₃", "NH3"),
    preset("c6h12o6", "C₆H₁₂O₆", "C6H12O6"),
];

pub static REACTION_EQUATIONS: [Preset; 12] = [
    preset(
        "sulfuric-reaction",
        "Copper in sulfuric acid",
        "H2SO4 + Cu -> CuSO4 + SO2 + H2O",
    ),
    preset("hydrogen-burn", "Hydrogen combustion", "2H2 + O2 -> 2H2O"),
    preset(
        "lime-water",
        "Limewater and CO₂",
        "Ca(OH)2 + CO2 -> CaCO3 + H2O",
    ),
    preset(
        "iron-displacement",
        "Iron displaces copper",
        "Fe + CuSO4 -> FeSO4 + Cu",
    ),
    preset(
        "sodium-water",
        "Sodium and water",
        "2Na + 2H2O -> 2NaOH + H2",
    ),
    preset(
        "kclo3-heat",
        "Heating KClO₃",
        "2KClO3 ->[MnO2] 2KCl + 3O2",
    ),
    preset(
        "h2o2-catalyst",
        "H₂O₂ decomposition",
        "2H2O2 ->[MnO2] 2H2O + O2",
    ),
    preset(
        "ammonia-synthesis",
        "Ammonia synthesis",
        "N2 + 3H2 <=>[catalyst][high T, P] 2NH3",
    ),
    preset(
        "so2-oxidation",
        "SO₂ oxidation",
        "2SO2 + O2 <=>[V2O5][450°C] 2SO3",
    ),
    preset(
        "methane-burn",
        "Methane combustion",
        "CH4 + 2O2 ->[ignite] CO2 + 2H2O",
    ),
    preset(
        "copper-nitric",
        "Copper and nitric acid",
        "Cu + 4HNO3 -> Cu(NO3)2 + 2NO2 + 2H2O",
    ),
    preset(
        "calcium-carbonate",
        "CaCO₃ decomposition",
        "CaCO3 ->[heat] CaO + CO2",
    ),
];

/// Iterate over every preset, molecular formulas first.
pub fn all() -> impl Iterator<Item = &'static Preset> {
    MOLECULAR_FORMULAS.iter().chain(REACTION_EQUATIONS.iter())
}

/// Look up a preset by id.
pub fn find(id: &str) -> Option<&'static Preset> {
    all().find(|preset| preset.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = all().map(|p| p.id).collect();
        assert_eq!(ids.len(), MOLECULAR_FORMULAS.len() + REACTION_EQUATIONS.len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("h2o").map(|p| p.formula), Some("H2O"));
        assert_eq!(
            find("kclo3-heat").map(|p| p.formula),
            Some("2KClO3 ->[MnO2] 2KCl + 3O2")
        );
        assert!(find("unobtainium").is_none());
    }

    #[test]
    fn test_reactions_contain_arrows() {
        for preset in REACTION_EQUATIONS.iter() {
            assert!(
                preset.formula.contains("->") || preset.formula.contains("<=>"),
                "{} has no arrow",
                preset.id
            );
        }
    }
}
