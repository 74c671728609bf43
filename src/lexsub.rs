use std::collections::HashMap;

use crate::addcos::sim_add;
use crate::embedding::EmbeddingTable;
use crate::ppdb::ParaphraseEntry;
use crate::word_pos::{get_base_form, read_word_pos, splitpop, to_str, WordPos};

/// Score every candidate substitute for the target at `idx` with the
/// additive AddCos metric. Candidates are plain words; each is looked up
/// under the target's POS tag (substitutes are assumed to share it), with
/// the sentinel zero vector standing in for unknown words. Scores come
/// back in scoring order so downstream ranking can break ties stably.
pub fn lexsub_score_list(sent_toks: &[String], idx: usize, sublist: &[String],
                         table: &EmbeddingTable, cwin: usize) -> Vec<(String, f32)> {
    let c = table.context_matrix(sent_toks, idx, cwin);
    let target = &sent_toks[idx];
    let (_, tgt_pos) = splitpop(target, '_');
    let t = table.word_vec_norm(target);

    sublist.iter()
        .map(|sub| {
            let sub_pos = format!("{}_{}", sub, tgt_pos);
            let s = table.word_vec_norm(&sub_pos);
            (sub.clone(), sim_add(s, t, c.view()))
        })
        .collect()
}

/// Sort scored substitutes by descending score. The sort is stable, so
/// equal scores keep their scoring-pass order. `top` limits the list.
pub fn rank_substitutes(mut scored: Vec<(String, f32)>, top: Option<usize>) -> Vec<(String, f32)> {
    scored.sort_by(|(_, sim1), (_, sim2)| {
        sim2.partial_cmp(sim1).unwrap_or_else(
            || match (sim2.is_nan(), sim1.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (false, true) => std::cmp::Ordering::Greater,
                (true, false) => std::cmp::Ordering::Less,
                (false, false) => panic!(),
            }
        )
    });
    if let Some(k) = top {
        scored.truncate(k);
    }
    scored
}

/// Choose substitution candidates for one instance from prefetched
/// paraphrase lists: first the exact tagged target, then the base form
/// derived from the `word.p` target, then give up with a diagnostic.
/// Candidates scoring below `minscore` are dropped.
pub fn select_candidates(orig_tgt: &str, tgt: &str,
                         ppdblist: &HashMap<WordPos, Vec<ParaphraseEntry>>,
                         minscore: f32) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    static EMPTY: Vec<ParaphraseEntry> = Vec::new();
    let mut tgt_wp = read_word_pos(orig_tgt);
    let mut cands = ppdblist.get(&tgt_wp).unwrap_or(&EMPTY);
    if cands.is_empty() {
        tgt_wp = read_word_pos(&get_base_form(tgt)?);
        cands = ppdblist.get(&tgt_wp).unwrap_or(&EMPTY);
        if cands.is_empty() {
            eprintln!("could not find PPDB candidates for target {} or its base form {}",
                      to_str(&read_word_pos(orig_tgt)), to_str(&tgt_wp));
        }
    }
    let good: Vec<String> = cands.iter()
        .filter(|e| e.scores.first().map_or(false, |&s| s >= minscore))
        .map(|e| e.term.clone())
        .collect();
    if good.is_empty() && !cands.is_empty() {
        eprintln!("no PPDB candidates for target {} after filtering for minscore {:.2}",
                  to_str(&tgt_wp), minscore);
    }
    Ok(good)
}

/// One output line: `id--p--word ::  sub score // sub score //...`,
/// substitutes already ranked.
pub fn result_str(id: i64, tgt: &str, ranked: &[(String, f32)]) -> String {
    let (w, p) = splitpop(tgt, '.');
    let mut s = format!("{}--{}--{} :: ", id, p, w);
    for (sub, scr) in ranked {
        s.push_str(&format!(" {} {} //", sub, scr));
    }
    s
}
