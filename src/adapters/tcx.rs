//! TCX track-point adapter
//!
//! Streams `<Trackpoint>` elements out of a Training Center XML document.
//! Elements are matched by local name, so namespace prefixes on extension
//! elements (`ns3:Speed`, `ns3:Watts`) do not matter.

use crate::error::FluxError;
use crate::schema::{Field, FieldMapping};
use crate::types::RawFieldRecord;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::SourceAdapter;

/// TCX payload adapter
pub struct TcxAdapter;

impl SourceAdapter for TcxAdapter {
    fn format(&self) -> &'static str {
        "tcx"
    }

    fn mapping(&self) -> FieldMapping {
        // TCX positions are already decimal degrees
        FieldMapping::degree_positions()
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<RawFieldRecord>, FluxError> {
        let mut reader = Reader::from_reader(raw);
        reader.trim_text(true);

        let mut records = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<RawFieldRecord> = None;
        // text of the open leaf, joined across comments and CDATA sections
        let mut text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if name == "Trackpoint" {
                        current = Some(RawFieldRecord::new());
                    }
                    path.push(name);
                    text.clear();
                }
                Ok(Event::End(e)) => {
                    if let (Some(record), Some(field)) = (current.as_mut(), trackpoint_field(&path)) {
                        if !text.is_empty() {
                            record.insert(field.as_str(), std::mem::take(&mut text));
                        }
                    }
                    text.clear();
                    path.pop();
                    if e.local_name().as_ref() == b"Trackpoint" {
                        if let Some(record) = current.take() {
                            records.push(record);
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    if current.is_some() && trackpoint_field(&path).is_some() {
                        let unescaped = t
                            .unescape()
                            .map_err(|e| FluxError::XmlError(e.to_string()))?;
                        text.push_str(&unescaped);
                    }
                }
                Ok(Event::CData(c)) => {
                    if current.is_some() && trackpoint_field(&path).is_some() {
                        text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(FluxError::XmlError(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        if current.is_some() {
            return Err(FluxError::XmlError(
                "document ended inside a Trackpoint".to_string(),
            ));
        }

        Ok(records)
    }
}

/// Field for the element at the end of `path`, if it is a track-point value
fn trackpoint_field(path: &[String]) -> Option<Field> {
    let (leaf, parents) = path.split_last()?;
    let parent = parents.last().map(String::as_str);

    match (parent, leaf.as_str()) {
        (Some("Trackpoint"), "Time") => Some(Field::Timestamp),
        (Some("Position"), "LatitudeDegrees") => Some(Field::PositionLat),
        (Some("Position"), "LongitudeDegrees") => Some(Field::PositionLong),
        (Some("Trackpoint"), "AltitudeMeters") => Some(Field::Altitude),
        (Some("Trackpoint"), "DistanceMeters") => Some(Field::Distance),
        (Some("HeartRateBpm"), "Value") => Some(Field::HeartRate),
        (Some("Trackpoint"), "Cadence") => Some(Field::Cadence),
        (_, "Speed") => Some(Field::Speed),
        (_, "Watts") => Some(Field::Power),
        _ => None,
    }
}
