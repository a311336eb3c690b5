//! Decides, table by table, whether a parsed move is top-level or a follow-up and which move it
//! hangs off.
//!
//! Attachment rules, in order:
//!
//! 1. The move was announced by a follow-ups header, or its name starts with the follow-up marker
//!    glyph: attach to the announced target, else to the current cursor (the last top-level move).
//! 2. Its input contains `~`: attach to an already-built move (top-level or one follow-up level
//!    deep) whose input is a prefix of the segment before the first `~`. The current section is
//!    searched before earlier ones. An exact input match beats a prefix, a longer input beats a
//!    shorter one; remaining ties are reported.
//! 3. Otherwise it is a top-level move and becomes the new cursor.
//!
//! The cursor and any announced target are cleared at every section heading.
use crate::codec::{diagnostic::BuildDiagnostic, variants::DraftMove};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionDraft {
    pub title: String,
    pub moves: Vec<DraftMove>,
}

impl SectionDraft {
    pub fn new<S: Into<String>>(title: S) -> SectionDraft {
        SectionDraft {
            title: title.into(),
            moves: Vec::new(),
        }
    }
}

/// Where a draft lives: section index, then top-level index followed by follow-up indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub section: usize,
    pub path: Vec<usize>,
}

impl Slot {
    pub fn top_level(section: usize, index: usize) -> Slot {
        Slot {
            section,
            path: vec![index],
        }
    }

    fn child(&self, index: usize) -> Slot {
        let mut path = self.path.clone();
        path.push(index);
        Slot {
            section: self.section,
            path,
        }
    }
}

pub fn draft_at<'a>(sections: &'a [SectionDraft], slot: &Slot) -> Option<&'a DraftMove> {
    let (first, rest) = slot.path.split_first()?;
    let top = sections.get(slot.section)?.moves.get(*first)?;
    rest.iter().try_fold(top, |mv, idx| mv.follow_ups.get(*idx))
}

pub fn draft_at_mut<'a>(sections: &'a mut [SectionDraft], slot: &Slot) -> Option<&'a mut DraftMove> {
    let (first, rest) = slot.path.split_first()?;
    let mut current = sections.get_mut(slot.section)?.moves.get_mut(*first)?;
    for idx in rest {
        current = current.follow_ups.get_mut(*idx)?;
    }
    Some(current)
}

/// Top-level moves and their direct follow-ups, current section first.
fn shallow_moves(sections: &[SectionDraft]) -> impl Iterator<Item = (Slot, &DraftMove)> {
    sections
        .iter()
        .enumerate()
        .rev()
        .flat_map(|(s_idx, section)| {
            section.moves.iter().enumerate().flat_map(move |(m_idx, mv)| {
                let top = Slot::top_level(s_idx, m_idx);
                let children = mv
                    .follow_ups
                    .iter()
                    .enumerate()
                    .map(move |(f_idx, f)| (Slot::top_level(s_idx, m_idx).child(f_idx), f));
                std::iter::once((top, mv)).chain(children)
            })
        })
}

/// The move whose (case-insensitive) name is the longest one contained in `text`.
pub fn find_named(sections: &[SectionDraft], text: &str) -> Option<Slot> {
    let text = text.to_lowercase();
    let mut best: Option<(usize, Slot)> = None;
    for (slot, mv) in shallow_moves(sections) {
        let name = mv.name.to_lowercase();
        if name.is_empty() || !text.contains(&name) {
            continue;
        }
        if best.as_ref().is_none_or(|(len, _)| name.len() > *len) {
            best = Some((name.len(), slot));
        }
    }
    best.map(|(_, slot)| slot)
}

#[derive(Debug, Clone)]
pub struct ChainLinker {
    marker: String,
    cursor: Option<Slot>,
    pending: Option<Slot>,
}

impl ChainLinker {
    pub fn new<S: Into<String>>(marker: S) -> ChainLinker {
        ChainLinker {
            marker: marker.into(),
            cursor: None,
            pending: None,
        }
    }

    /// Forget the cursor and any announced target.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.pending = None;
    }

    pub fn cursor(&self) -> Option<&Slot> {
        self.cursor.as_ref()
    }

    /// The next linked move attaches under `target`.
    pub fn expect_follow_ups(&mut self, target: Slot) {
        self.pending = Some(target);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_marked(&self, name: &str) -> bool {
        !self.marker.is_empty() && name.trim_start().starts_with(&self.marker)
    }

    /// Push `draft` as a follow-up of the move at `target`, returning its slot, or hand the draft
    /// back when `target` no longer exists.
    pub fn attach(
        sections: &mut [SectionDraft],
        target: &Slot,
        mut draft: DraftMove,
    ) -> Result<Slot, DraftMove> {
        match draft_at_mut(sections, target) {
            Some(parent) => {
                draft.parent = Some(parent.name.clone());
                parent.follow_ups.push(draft);
                Ok(target.child(parent.follow_ups.len() - 1))
            }
            None => Err(draft),
        }
    }

    pub fn link(
        &mut self,
        sections: &mut Vec<SectionDraft>,
        mut draft: DraftMove,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Slot {
        if sections.is_empty() {
            sections.push(SectionDraft::new("Moves"));
        }

        let pending = self.pending.take();
        if pending.is_some() || self.is_marked(&draft.name) {
            match pending.or_else(|| self.cursor.clone()) {
                Some(target) => match Self::attach(sections, &target, draft) {
                    Ok(slot) => return slot,
                    Err(returned) => {
                        diagnostics.push(BuildDiagnostic::warning(format!(
                            "follow-up target for {:?} vanished",
                            returned.name
                        )));
                        draft = returned;
                    }
                },
                None => diagnostics.push(BuildDiagnostic::OrphanFollowUp(draft.name.clone())),
            }
        }

        if let Some(target) = self.input_parent(sections, &draft, diagnostics) {
            match Self::attach(sections, &target, draft) {
                Ok(slot) => return slot,
                Err(returned) => draft = returned,
            }
        }

        let section = sections.len() - 1;
        let moves = &mut sections[section].moves;
        moves.push(draft);
        let slot = Slot::top_level(section, moves.len() - 1);
        self.cursor = Some(slot.clone());
        slot
    }

    fn input_parent(
        &self,
        sections: &[SectionDraft],
        draft: &DraftMove,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Option<Slot> {
        let (segment, _) = draft.input.as_deref()?.split_once('~')?;
        let segment = segment.trim().to_lowercase();
        if segment.is_empty() {
            return None;
        }

        // (exact, input length) ranks candidates
        let mut best: Option<((bool, usize), Slot, String)> = None;
        let mut tied: Vec<String> = Vec::new();
        let mut searched_section = None;
        for (slot, mv) in shallow_moves(sections) {
            if best.is_some() && searched_section != Some(slot.section) {
                break;
            }
            searched_section = Some(slot.section);
            let Some(input) = mv.input.as_deref().map(|i| i.trim().to_lowercase()) else {
                continue;
            };
            if input.is_empty() || !segment.starts_with(&input) {
                continue;
            }
            let rank = (input == segment, input.len());
            match &best {
                Some((best_rank, _, _)) if rank < *best_rank => {}
                Some((best_rank, _, _)) if rank == *best_rank => tied.push(mv.name.clone()),
                _ => {
                    tied = vec![mv.name.clone()];
                    best = Some((rank, slot, mv.name.clone()));
                }
            }
        }

        let (_, slot, chosen) = best?;
        if tied.len() > 1 {
            diagnostics.push(BuildDiagnostic::ambiguous(draft.name.clone(), chosen, tied));
        }
        Some(slot)
    }
}
