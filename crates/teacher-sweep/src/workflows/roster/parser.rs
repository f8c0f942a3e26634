use super::RosterError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

const TEACHER_TAG: &[u8] = b"profesor";
const USER_DATA_TAG: &[u8] = b"datos-usuario-rayuela";
const LOGIN_TAG: &[u8] = b"login";

/// Depths of the elements the walker cares about, root being 1.
const TEACHER_DEPTH: usize = 2;
const USER_DATA_DEPTH: usize = 3;
const LOGIN_DEPTH: usize = 4;

#[derive(Debug, Default)]
struct Cursor {
    depth: usize,
    root_seen: bool,
    in_teacher: bool,
    user_data_seen: bool,
    in_user_data: bool,
    login_seen: bool,
    in_login: bool,
    text: String,
}

impl Cursor {
    fn open(&mut self, name: &[u8]) -> Result<(), RosterError> {
        if self.depth == 0 {
            if self.root_seen {
                return Err(RosterError::Malformed(
                    "more than one root element".to_string(),
                ));
            }
            self.root_seen = true;
        }
        self.depth += 1;

        match self.depth {
            TEACHER_DEPTH if name == TEACHER_TAG => {
                self.in_teacher = true;
                self.user_data_seen = false;
            }
            USER_DATA_DEPTH if self.in_teacher && !self.user_data_seen && name == USER_DATA_TAG => {
                self.in_user_data = true;
                self.user_data_seen = true;
                self.login_seen = false;
            }
            LOGIN_DEPTH if self.in_user_data && !self.login_seen && name == LOGIN_TAG => {
                self.in_login = true;
                self.login_seen = true;
                self.text.clear();
            }
            _ => {}
        }
        Ok(())
    }

    /// Closes the current element, returning a login when one just ended.
    fn close(&mut self) -> Result<Option<String>, RosterError> {
        let mut finished = None;
        match self.depth {
            0 => {
                return Err(RosterError::Malformed(
                    "closing tag without matching opening tag".to_string(),
                ))
            }
            LOGIN_DEPTH if self.in_login => {
                self.in_login = false;
                finished = Some(std::mem::take(&mut self.text));
            }
            USER_DATA_DEPTH if self.in_user_data => self.in_user_data = false,
            TEACHER_DEPTH if self.in_teacher => self.in_teacher = false,
            _ => {}
        }
        self.depth -= 1;
        Ok(finished)
    }

    fn text(&mut self, content: &str) -> Result<(), RosterError> {
        if self.depth == 0 {
            if content.trim().is_empty() {
                return Ok(());
            }
            return Err(RosterError::Malformed(
                "text outside of the root element".to_string(),
            ));
        }
        if self.in_login && self.depth == LOGIN_DEPTH {
            self.text.push_str(content);
        }
        Ok(())
    }
}

/// Walks the roster and yields the raw (untrimmed) text of every login field
/// that sits under `profesor/datos-usuario-rayuela/login`.
pub(crate) fn parse_logins<R: BufRead>(source: R) -> Result<Vec<String>, RosterError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut cursor = Cursor::default();
    let mut logins = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => cursor.open(element.name().as_ref())?,
            Event::Empty(element) => {
                cursor.open(element.name().as_ref())?;
                if let Some(login) = cursor.close()? {
                    logins.push(login);
                }
            }
            Event::End(_) => {
                if let Some(login) = cursor.close()? {
                    logins.push(login);
                }
            }
            Event::Text(text) => cursor.text(&text.unescape()?)?,
            Event::CData(data) => cursor.text(&String::from_utf8_lossy(&data.into_inner()))?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !cursor.root_seen {
        return Err(RosterError::Malformed(
            "document has no root element".to_string(),
        ));
    }
    if cursor.depth != 0 {
        return Err(RosterError::Malformed(
            "document ended before every element was closed".to_string(),
        ));
    }

    Ok(logins)
}
