//! TSPL command builder
//!
//! Text printer language accepted by MHT-series label printers. Every
//! directive is one ASCII line terminated by CRLF; quoted payloads cannot
//! contain a double quote.

use serde::{Deserialize, Serialize};

/// Horizontal anchoring of a `TEXT` payload relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left = 1,
    Center = 2,
    Right = 3,
}

/// Accumulates directives into a job buffer.
#[derive(Debug, Default)]
pub struct TsplWriter {
    buf: Vec<u8>,
}

impl TsplWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, command: &str) {
        self.buf.extend_from_slice(command.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    pub fn size_mm(&mut self, width: u32, height: u32) {
        self.line(&format!("SIZE {} mm, {} mm", width, height));
    }

    pub fn gap_mm(&mut self, gap: u32, offset: u32) {
        self.line(&format!("GAP {} mm, {} mm", gap, offset));
    }

    pub fn direction(&mut self, direction: u8) {
        self.line(&format!("DIRECTION {}", direction));
    }

    pub fn cls(&mut self) {
        self.line("CLS");
    }

    pub fn density(&mut self, density: u8) {
        self.line(&format!("DENSITY {}", density));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn barcode(
        &mut self,
        x: u32,
        y: u32,
        symbology: &str,
        height: u32,
        human_readable: bool,
        rotation: u16,
        narrow: u32,
        wide: u32,
        payload: &str,
    ) {
        self.line(&format!(
            "BARCODE {},{},\"{}\",{},{},{},{},{},\"{}\"",
            x,
            y,
            symbology,
            height,
            u8::from(human_readable),
            rotation,
            narrow,
            wide,
            quoted(payload)
        ));
    }

    /// `TEXT x,y,"font",rotation,x-mul,y-mul[,alignment],"payload"`.
    pub fn text(&mut self, x: u32, y: u32, font: &TextFont, alignment: Option<Alignment>, payload: &str) {
        let head = format!(
            "TEXT {},{},\"{}\",{},{},{}",
            x, y, font.name, font.rotation, font.x_scale, font.y_scale
        );
        match alignment {
            Some(alignment) => self.line(&format!(
                "{},{},\"{}\"",
                head,
                alignment as u8,
                quoted(payload)
            )),
            None => self.line(&format!("{},\"{}\"", head, quoted(payload))),
        }
    }

    pub fn bar(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.line(&format!("BAR {},{},{},{}", x, y, width, height));
    }

    pub fn print(&mut self, sets: u32, copies: u32) {
        self.line(&format!("PRINT {},{}", sets, copies));
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Font selection shared by `TEXT` directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFont {
    pub name: String,
    pub rotation: u16,
    pub x_scale: u8,
    pub y_scale: u8,
}

impl Default for TextFont {
    fn default() -> Self {
        Self {
            name: "3".to_string(),
            rotation: 0,
            x_scale: 1,
            y_scale: 1,
        }
    }
}

fn quoted(payload: &str) -> String {
    payload.replace('"', "'").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(writer: TsplWriter) -> String {
        String::from_utf8(writer.finish()).unwrap()
    }

    #[test]
    fn test_setup_directives() {
        let mut w = TsplWriter::new();
        w.size_mm(101, 76);
        w.gap_mm(3, 0);
        w.direction(1);
        w.cls();
        w.density(12);
        assert_eq!(
            lines(w),
            "SIZE 101 mm, 76 mm\r\nGAP 3 mm, 0 mm\r\nDIRECTION 1\r\nCLS\r\nDENSITY 12\r\n"
        );
    }

    #[test]
    fn test_text_with_and_without_alignment() {
        let font = TextFont::default();
        let mut w = TsplWriter::new();
        w.text(400, 125, &font, Some(Alignment::Center), "Lote: L5");
        w.text(60, 260, &font, None, "LARGO");
        assert_eq!(
            lines(w),
            "TEXT 400,125,\"3\",0,1,1,2,\"Lote: L5\"\r\nTEXT 60,260,\"3\",0,1,1,\"LARGO\"\r\n"
        );
    }

    #[test]
    fn test_barcode_and_bar() {
        let mut w = TsplWriter::new();
        w.barcode(60, 20, "128", 60, true, 0, 3, 3, "F001");
        w.bar(40, 155, 720, 3);
        w.print(1, 1);
        assert_eq!(
            lines(w),
            "BARCODE 60,20,\"128\",60,1,0,3,3,\"F001\"\r\nBAR 40,155,720,3\r\nPRINT 1,1\r\n"
        );
    }

    #[test]
    fn test_payload_cannot_break_out_of_quotes() {
        let mut w = TsplWriter::new();
        w.text(0, 0, &TextFont::default(), None, "2\" x 4\"\r\nPRINT 9");
        assert_eq!(lines(w), "TEXT 0,0,\"3\",0,1,1,\"2' x 4'  PRINT 9\"\r\n");
    }
}
