//! Indented line writer for generated source

const INDENT: &str = "    ";

/// Accumulates generated source one line at a time
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current depth
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    /// Write a line and indent what follows
    pub fn open(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    /// Dedent and write a closing line
    pub fn close(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// Empty line
    pub fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    /// The text written so far
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_is_indented() {
        let mut writer = SourceWriter::new();
        writer
            .open("impl A {")
            .open("fn f() {")
            .line("g();")
            .close("}")
            .blank()
            .close("}");
        assert_eq!(
            writer.finish(),
            "impl A {\n    fn f() {\n        g();\n    }\n\n}\n"
        );
    }

    #[test]
    fn unbalanced_close_does_not_underflow() {
        let mut writer = SourceWriter::new();
        writer.close("}");
        assert_eq!(writer.finish(), "}\n");
    }
}
