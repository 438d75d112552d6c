//! Utilidades de validación
//!
//! Normalización y validación de matrículas en la frontera de entrada.
//! El núcleo de agregación asume matrículas ya normalizadas.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref REGISTRATION_NUMBER_REGEX: Regex =
        Regex::new(r"^[A-Z0-9]{2,7}$").expect("registration number regex is valid");
}

/// Pasar a mayúsculas y quitar espacios ("ab12 cde" -> "AB12CDE")
pub fn normalize_registration_number(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Validar formato de matrícula ya normalizada: 2 a 7 caracteres alfanuméricos
pub fn validate_registration_number(value: &str) -> Result<(), ValidationError> {
    if !REGISTRATION_NUMBER_REGEX.is_match(value) {
        let mut error = ValidationError::new("registration_number");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"2-7 letters or digits".to_string());
        return Err(error);
    }
    Ok(())
}
