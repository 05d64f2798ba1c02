use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use crate::core::types::Orientation;
use crate::parsing::ParseError;

/// File written by the instrument at the root of each run directory
pub const RUN_PARAMETERS_FILE: &str = "RunParameters.xml";

const CHEMISTRY_ELEMENT: &str = "Chemistry";

/// Extract the text of the first `<Chemistry>` element.
///
/// # Errors
///
/// Returns `ParseError::Xml` if the document is malformed, or
/// `ParseError::MissingElement` if it has no `Chemistry` element.
pub fn parse_chemistry(xml: &str, file: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_chemistry = false;
    let mut chemistry = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == CHEMISTRY_ELEMENT.as_bytes() => {
                in_chemistry = true;
            }
            Ok(Event::Text(e)) if in_chemistry => {
                let text = e.unescape().map_err(|e| ParseError::Xml(format!("{file}: {e}")))?;
                chemistry.push_str(&text);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == CHEMISTRY_ELEMENT.as_bytes() => {
                return Ok(chemistry.trim().to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(format!("{file}: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Err(ParseError::MissingElement {
        file: file.to_string(),
        element: CHEMISTRY_ELEMENT.to_string(),
    })
}

/// Read `RunParameters.xml` from a run directory and derive the index 2 orientation
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or the errors of [`parse_chemistry`].
pub fn read_orientation(run_dir: &Path) -> Result<Orientation, ParseError> {
    let path = run_dir.join(RUN_PARAMETERS_FILE);
    let xml = std::fs::read_to_string(&path)?;
    let chemistry = parse_chemistry(&xml, &path.display().to_string())?;
    Ok(Orientation::from_chemistry(&chemistry))
}
