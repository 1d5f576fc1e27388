/// Keeps only the most recent value; a delayed action holding an older
/// token gets nothing when it fires.
#[derive(Debug)]
pub struct Debounce<T> {
    latest: Option<T>,
    token: u64,
}

impl<T> Debounce<T> {
    pub fn new() -> Self {
        Self {
            latest: None,
            token: 0,
        }
    }

    /// Replaces the pending value and returns the token the delayed action must present.
    pub fn push(&mut self, value: T) -> u64 {
        self.token = self.token.wrapping_add(1);
        self.latest = Some(value);
        self.token
    }

    pub fn fire(&mut self, token: u64) -> Option<T> {
        if token != self.token {
            return None;
        }
        self.latest.take()
    }

}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_last_value_survives() {
        let mut debounce = Debounce::new();
        let first = debounce.push(40);
        let second = debounce.push(55);
        let third = debounce.push(70);
        assert_eq!(debounce.fire(first), None);
        assert_eq!(debounce.fire(second), None);
        assert_eq!(debounce.fire(third), Some(70));
        assert_eq!(debounce.fire(third), None);
    }

    #[test]
    fn fired_value_is_consumed() {
        let mut debounce = Debounce::new();
        let token = debounce.push("a");
        assert_eq!(debounce.fire(token), Some("a"));
        assert_eq!(debounce.fire(token), None);
    }
}
