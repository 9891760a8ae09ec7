//! Rooms and professionals offered by the staff panel.
//!
//! The catalog only feeds the panel's pickers. Submissions are not checked
//! against it, so a room or professional missing from the list can still be
//! called.

use serde::{Deserialize, Serialize};

/// Professionals sharing one role, as shown under a single heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalGroup {
    pub role: String,
    pub names: Vec<String>,
}

/// Picker contents for the staff panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub rooms: Vec<String>,
    pub professionals: Vec<ProfessionalGroup>,
}

const DEFAULT_ROOMS: &[&str] = &[
    "1 Consultório",
    "2 Consultório",
    "3 Consultório",
    "4 Consultório",
    "5 Consultório",
    "6 Vacinação",
    "7 Triagem",
    "8 Odontologia",
    "9 Curativo",
    "9 Medicação",
    "10 Consultório",
    "Pós-consulta",
    "Recepção",
    "Farmácia",
    "Medicação",
    "Ginecologia",
    "Telemedicina",
];

const DEFAULT_PROFESSIONALS: &[(&str, &[&str])] = &[
    (
        "Consulta Médica",
        &[
            "Doutora Bruna",
            "Doutor Guilherme",
            "Doutora Maria Jose",
            "Médico (Outro)",
        ],
    ),
    ("Consulta Ginecologia", &["Doutora Anselma"]),
    ("Consulta Enfermagem", &["Cintia", "Jason", "Karoline"]),
    ("Consulta Odontologia", &["Doutora Karina"]),
    ("Consulta Nutricionista", &["Nataly"]),
    (
        "Técnicos de Enfermagem",
        &["Eva", "Vera Lucia", "Thiago", "Catia", "Beatriz"],
    ),
    (
        "ACS",
        &[
            "Alessandra",
            "Bruno",
            "Diogo",
            "Gabriela",
            "Laudeli",
            "Jackeline",
            "Victor Hugo",
            "Taiz",
        ],
    ),
    ("Administrativo", &["Sarah"]),
];

impl Default for Catalog {
    fn default() -> Self {
        Self {
            rooms: DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect(),
            professionals: DEFAULT_PROFESSIONALS
                .iter()
                .map(|(role, names)| ProfessionalGroup {
                    role: role.to_string(),
                    names: names.iter().map(|n| n.to_string()).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_populated() {
        let catalog = Catalog::default();
        assert_eq!(catalog.rooms.len(), 17);
        assert!(catalog.rooms.iter().any(|r| r == "7 Triagem"));
        assert!(catalog
            .professionals
            .iter()
            .any(|g| g.names.iter().any(|n| n == "Doutora Karina")));
    }
}
