//! Parseo de fechas de los proveedores
//!
//! Cada proveedor usa su propio formato textual: el servicio de estado
//! (VES) envía fechas `2024-05-01`, el historial MOT envía `2020.10.21`
//! para fechas y `2020.10.21 08:17:47` para marcas de tiempo. Todas se
//! interpretan en UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, ParseResult, TimeZone, Utc};

/// Fechas del servicio de estado (taxDueDate, artEndDate...)
pub const VES_DATE_FORMAT: &str = "%Y-%m-%d";

/// Fechas del historial MOT (expiryDate, firstUsedDate...)
pub const MOT_DATE_FORMAT: &str = "%Y.%m.%d";

/// Formatos alternativos aceptados en las fechas del historial MOT
pub const MOT_DATE_FALLBACK_FORMATS: &[&str] = &[VES_DATE_FORMAT];

/// Marcas de tiempo del historial MOT (completedDate)
pub const MOT_DATE_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Parsear una fecha sin hora; el resultado queda a medianoche UTC
pub fn parse_date_only(value: &str, pattern: &str) -> ParseResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), pattern)?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Parsear con `pattern` y, si falla, con cada patrón de `fallbacks` en orden
///
/// El error devuelto es el del último patrón probado.
pub fn parse_date_only_with_fallback(
    value: &str,
    pattern: &str,
    fallbacks: &[&str],
) -> ParseResult<DateTime<Utc>> {
    fallbacks
        .iter()
        .fold(parse_date_only(value, pattern), |parsed, fallback| {
            parsed.or_else(|_| parse_date_only(value, fallback))
        })
}

/// Parsear una fecha con hora
pub fn parse_date_time(value: &str, pattern: &str) -> ParseResult<DateTime<Utc>> {
    let date_time = NaiveDateTime::parse_from_str(value.trim(), pattern)?;
    Ok(Utc.from_utc_datetime(&date_time))
}
