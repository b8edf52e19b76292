use std::io::{self, Write};

use serde_json::Value;

use crate::error::CliError;

pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    write_json(&mut stdout.lock(), data, pretty)
}

fn write_json(writer: &mut impl Write, data: &Value, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, data)?;
    } else {
        serde_json::to_writer(&mut *writer, data)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn writes_one_line_per_document() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &json!({"symbol": "AAPL"}), false).expect("write");
        assert_eq!(String::from_utf8(buffer).expect("utf8"), "{\"symbol\":\"AAPL\"}\n");
    }
}
