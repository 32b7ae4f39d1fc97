use ahash::HashSet;

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: u64 = ALPHA.len() as u64;

/// Identifier for the counter value, lowercase-first: `a` through `z`, then
/// `A` through `Z`, then two letters, and so on.
fn encode(counter: u64) -> String {
  let mut digits = Vec::new();
  let mut at = counter;
  loop {
    digits.push((at % BASE) as usize);
    at /= BASE;
    if at == 0 {
      break;
    }
  }
  // Non-final digits wrap down by one so the first two-letter name is `aa`.
  let mut out = String::with_capacity(digits.len());
  for (i, d) in digits.iter().enumerate().rev() {
    let rank = if i == 0 { *d } else { (*d + 51) % 52 };
    out.push(ALPHA[rank] as char);
  }
  out
}

/// Infinite source of short replacement names. Names in the exclusion set are
/// skipped but still consume a counter value, so two generators with the same
/// exclusions and counter emit the same stream.
#[derive(Clone, Debug)]
pub struct NameGenerator {
  excluded: HashSet<String>,
  issued: HashSet<String>,
  counter: u64,
}

impl NameGenerator {
  pub fn new(excluded: HashSet<String>) -> NameGenerator {
    NameGenerator::with_counter(excluded, 0)
  }

  pub fn with_counter(excluded: HashSet<String>, counter: u64) -> NameGenerator {
    NameGenerator {
      excluded,
      issued: HashSet::default(),
      counter,
    }
  }

  pub fn counter(&self) -> u64 {
    self.counter
  }

  /// True if this generator has handed out `name`.
  pub fn was_issued(&self, name: &str) -> bool {
    self.issued.contains(name)
  }

  pub fn next_name(&mut self) -> String {
    loop {
      let candidate = encode(self.counter);
      self.counter += 1;
      if !self.excluded.contains(&candidate) {
        self.issued.insert(candidate.clone());
        return candidate;
      }
    }
  }
}

impl Iterator for NameGenerator {
  type Item = String;

  fn next(&mut self) -> Option<String> {
    Some(self.next_name())
  }
}
