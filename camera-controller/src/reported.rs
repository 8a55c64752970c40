use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("The camera has not reported this value yet")]
pub struct NotSet;

/// Last value the camera reported for one attribute.
///
/// A cell only goes back to `Unset` when the whole camera state is reset.
#[derive(Clone, Debug, PartialEq)]
pub enum Reported<T> {
    Unset,
    Set(T),
}

impl<T> Default for Reported<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Reported<T> {
    /// Stores a freshly reported value, replacing any earlier one.
    pub fn on_receive(&mut self, value: T) {
        *self = Self::Set(value);
    }

    pub fn has(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn get(&self) -> std::result::Result<&T, NotSet> {
        match self {
            Self::Set(value) => Ok(value),
            Self::Unset => Err(NotSet),
        }
    }

    pub fn as_option(&self) -> Option<&T> {
        self.get().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unset_until_received() {
        let mut cell = Reported::default();
        assert!(!cell.has());
        assert_eq!(cell.get(), Err(NotSet));
        cell.on_receive(5600);
        assert!(cell.has());
        assert_eq!(cell.get(), Ok(&5600));
        cell.on_receive(3200);
        assert_eq!(cell.get(), Ok(&3200));
    }
}
