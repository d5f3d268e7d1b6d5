//! Regex patterns shared by the extraction cascades

use lazy_static::lazy_static;
use regex::Regex;

/// Identification code: `12.599.237-4`, `12599237-4`, `7.654.321-k`
pub const ID_CODE: &str = r"\d{1,2}\.?\d{3}\.?\d{3}-[0-9Kk]";

lazy_static! {
    /// A code-shaped token anywhere in the text, capture group 1.
    ///
    /// Letters may be glued in front (`RUT12.599.237-4`); a digit or dot may
    /// not, so the tail of a longer number never matches.
    pub static ref ID_CODE_PATTERN: Regex =
        Regex::new(&format!(r"(?:^|[^\d.])({})", ID_CODE)).unwrap();

    /// Whole-string code check
    pub static ref ID_CODE_EXACT: Regex = Regex::new(&format!(r"^{}$", ID_CODE)).unwrap();

    /// `Periodo desde 01/03/2025`, capturing the month component
    pub static ref PERIOD_PATTERN: Regex =
        Regex::new(r"(?i)per[ií]odo\s+desde\s+\d{1,2}/(\d{1,2})/\d{4}").unwrap();

    /// `Trabajador RUT: 12.599.237-4 Nombre: Juan Perez` on a single line
    pub static ref COMBINED_PATTERN: Regex = Regex::new(&format!(
        r"(?im)trabajador[ \t]+rut[ \t]*:?[ \t]*({})[ \t]*nombre[ \t]*:[ \t]*([^\r\n]+)",
        ID_CODE
    ))
    .unwrap();

    /// `Nombre: Juan Perez` up to end of line
    pub static ref NAME_LABEL_PATTERN: Regex =
        Regex::new(r"(?im)\bnombre[ \t]*:[ \t]*([^\r\n]+)").unwrap();

    /// Line mentioning an identity label word
    pub static ref ID_LABEL_WORD: Regex =
        Regex::new(r"(?i)\b(rut|trabajador|empleado)\b").unwrap();

    /// Line consisting solely of an employee/worker label
    pub static ref BARE_WORKER_LABEL: Regex =
        Regex::new(r"(?i)^(trabajador|empleado|trabajadora|empleada)[ \t]*:?$").unwrap();

    /// `12.599.237-4 - JUAN PEREZ`
    pub static ref CODE_THEN_NAME: Regex = Regex::new(&format!(
        r"^({})[ \t]*[-–—:|]?[ \t]*(.*)$",
        ID_CODE
    ))
    .unwrap();

    /// `JUAN PEREZ - 12.599.237-4`
    pub static ref NAME_THEN_CODE: Regex = Regex::new(&format!(
        r"^(.+?)[ \t]*[-–—|][ \t]*({})$",
        ID_CODE
    ))
    .unwrap();

    /// Line made only of uppercase (accented included) words
    pub static ref UPPERCASE_NAME_LINE: Regex =
        Regex::new(r"^[A-ZÁÉÍÓÚÜÑ]+(?:[ \t]+[A-ZÁÉÍÓÚÜÑ]+)*$").unwrap();

    /// Labels that end a positional name block
    pub static ref NON_NAME_LABEL: Regex = Regex::new(
        r"(?i)\b(departamento|depto|sucursal|c[oó]digo|fecha|empleado|trabajador|cargo|rut|centro\s+de\s+costo)\b"
    )
    .unwrap();
}
