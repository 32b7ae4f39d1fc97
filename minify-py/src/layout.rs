use itertools::Itertools;
use parse_py::lex::line_tokens;
use parse_py::token::is_keyword;
use std::collections::BTreeSet;

/// Consecutive lines sharing one indentation width, stored stripped.
struct Segment {
  indents: usize,
  lines: Vec<String>,
}

/// Minimizes the layout of already-rendered source: drops blank lines and
/// trailing whitespace, reduces indentation to one space per level, forms
/// `;`-joined one-liners, merges single-statement blocks into their header
/// line, and removes spacing between tokens wherever the result re-tokenizes
/// the same.
pub fn compact(source: &str) -> String {
  let lines = source
    .lines()
    .map(|line| line.trim_end())
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>();
  let mut segments = segments_from_lines(&lines);
  reduce_indentation(&mut segments);
  make_one_liners(&mut segments);
  let segments = merge_one_liners(segments);
  let mut out = Vec::new();
  for segment in &segments {
    for line in &segment.lines {
      out.push(tighten_line(&" ".repeat(segment.indents), line));
    }
  }
  out.join("\n")
}

fn segments_from_lines(lines: &[&str]) -> Vec<Segment> {
  let grouped = lines
    .iter()
    .map(|line| {
      let stripped = line.trim_start();
      (line.len() - stripped.len(), stripped.to_string())
    })
    .group_by(|(indents, _)| *indents);
  grouped
    .into_iter()
    .map(|(indents, group)| Segment {
      indents,
      lines: group.map(|(_, line)| line).collect(),
    })
    .collect()
}

/// Replaces each segment's indentation width with its depth rank. Widths are
/// ranked within the "valley" they belong to, so sibling blocks indented by
/// different widths still land on the same level.
fn reduce_indentation(segments: &mut [Segment]) {
  fn update_valley(segments: &mut [Segment], valley: &[usize], indents: &BTreeSet<usize>) {
    let sorted = indents.iter().copied().collect::<Vec<_>>();
    for i in valley.iter().copied() {
      segments[i].indents = sorted
        .iter()
        .position(|w| *w == segments[i].indents)
        .expect("valley indent width must be in the active set");
    }
  }

  let mut indents: BTreeSet<usize> = BTreeSet::new();
  let mut valley: Vec<usize> = Vec::new();
  for i in 0..segments.len() {
    let width = segments[i].indents;
    if indents.contains(&width) {
      // Went back up a level; the finished valley can be ranked now.
      update_valley(segments, &valley, &indents);
      valley = vec![i];
      let deepest = *indents.iter().next_back().expect("set is non-empty");
      if width != deepest {
        indents.remove(&deepest);
      }
      continue;
    }
    valley.push(i);
    indents.insert(width);
  }
  update_valley(segments, &valley, &indents);
}

/// Joins each segment's colon-less lines onto the previous line with `;`.
/// Block headers end with a colon and keep their own line.
fn make_one_liners(segments: &mut [Segment]) {
  for segment in segments.iter_mut() {
    let mut lines: Vec<String> = Vec::with_capacity(segment.lines.len());
    for line in segment.lines.drain(..) {
      if line.ends_with(':') || lines.is_empty() {
        lines.push(line);
      } else {
        let last = lines.last_mut().unwrap();
        last.push(';');
        last.push_str(&line);
      }
    }
    segment.lines = lines;
  }
}

/// Merges a single-line block into its header when the header's segment ends
/// with a colon. A trailing header with no following segment stays as is.
fn merge_one_liners(segments: Vec<Segment>) -> Vec<Segment> {
  let mut out: Vec<Segment> = Vec::new();
  let mut iter = segments.into_iter().peekable();
  while let Some(mut segment) = iter.next() {
    let header = segment
      .lines
      .last()
      .map(|line| line.ends_with(':'))
      .unwrap_or(false);
    if header {
      let mergeable = iter
        .peek()
        .map(|next| next.lines.len() == 1 && !next.lines[0].ends_with(':'))
        .unwrap_or(false);
      if mergeable {
        let next = iter.next().unwrap();
        segment
          .lines
          .last_mut()
          .unwrap()
          .push_str(&next.lines[0]);
      }
    }
    out.push(segment);
  }
  out
}

/// Re-tokenizes one line and joins the tokens back with the least spacing
/// that still tokenizes identically: a space survives only on either side of
/// a keyword, and not where `:`, `;` or `=` already separate it.
fn tighten_line(indent: &str, line: &str) -> String {
  let mut cells: Vec<String> = Vec::new();
  let mut last = indent.to_string();
  if !indent.is_empty() {
    cells.push(indent.to_string());
  }
  for token in line_tokens(line) {
    let joins_keyword =
      is_keyword(&token) && !cells.is_empty() && !last.ends_with([':', ';', '=', ' ']);
    if joins_keyword {
      cells.push(token.clone());
    } else if !cells.is_empty()
      && (!is_keyword(&last) || matches!(token.as_str(), ":" | ";" | "="))
    {
      cells.last_mut().unwrap().push_str(&token);
    } else {
      cells.push(token.clone());
    }
    last = token;
  }
  cells.join(" ")
}
