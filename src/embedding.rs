use ndarray::prelude::*;

use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Write;

use crate::addcos::context_window;

type V = f32;

fn norm_l2<S>(a: &ndarray::ArrayBase<S, Ix1>) -> f32
    where S: ndarray::Data<Elem = f32>
{
    a.iter().map(|x| *x * *x).sum::<f32>().sqrt()
}

/// Word and context vectors of a pretrained embedding model, prepared for
/// scoring: each of the four matrices has a zero row prepended at index 0
/// so out-of-vocabulary lookups resolve to a sentinel zero vector instead
/// of branching, and normalized copies of both spaces are precomputed.
pub struct EmbeddingTable {
    pub dim: usize,
    pub word_vecs: Array<V, Ix2>,
    pub word_vecs_norm: Array<V, Ix2>,
    pub ctx_vecs: Array<V, Ix2>,
    pub ctx_vecs_norm: Array<V, Ix2>,
    /// word -> 1-based row id; 0 is the sentinel
    pub w2i: HashMap<String, usize>,
    /// word -> relative corpus frequency, summing to 1 over the lexicon.
    /// Not consumed by scoring, kept as part of the model contract.
    pub w2f: HashMap<String, f64>,
}

/// Prepend a zero row, shifting real vectors to 1-based indices.
fn with_sentinel(vecs: &Array<V, Ix2>) -> Array<V, Ix2> {
    let (rows, dim) = vecs.dim();
    let mut out = Array::zeros((rows + 1, dim));
    out.slice_mut(s![1.., ..]).assign(vecs);
    out
}

/// Row-wise L2 normalization; a zero row normalizes to itself.
fn normalized_rows(vecs: &Array<V, Ix2>) -> Array<V, Ix2> {
    let mut out = vecs.clone();
    for mut row in out.rows_mut() {
        let n = norm_l2(&row);
        if n > 0. {
            row.iter_mut().for_each(|e| *e /= n);
        }
    }
    out
}

impl EmbeddingTable {
    /// Build the table from a raw model: vocabulary with occurrence
    /// counts in row order, plus the word- and context-vector matrices
    /// (identical shape, no sentinel row yet).
    pub fn from_raw(words: Vec<(String, u64)>, word_vecs: Array<V, Ix2>,
                    ctx_vecs: Array<V, Ix2>) -> EmbeddingTable {
        let dim = word_vecs.len_of(Axis(1));

        let word_vecs_norm = with_sentinel(&normalized_rows(&word_vecs));
        let ctx_vecs_norm = with_sentinel(&normalized_rows(&ctx_vecs));
        let word_vecs = with_sentinel(&word_vecs);
        let ctx_vecs = with_sentinel(&ctx_vecs);

        let mut w2i = HashMap::with_capacity(words.len());
        for (i, (word, _)) in words.iter().enumerate() {
            w2i.insert(word.clone(), i + 1);
        }
        let total: u64 = words.iter().map(|(_, c)| *c).sum();
        let mut w2f = HashMap::with_capacity(words.len());
        if total > 0 {
            for (word, count) in &words {
                w2f.insert(word.clone(), *count as f64 / total as f64);
            }
        }

        EmbeddingTable { dim, word_vecs, word_vecs_norm, ctx_vecs, ctx_vecs_norm, w2i, w2f }
    }

    pub fn lexsize(&self) -> usize {
        self.w2i.len()
    }

    /// Row id for a word; 0 (the sentinel) when absent.
    pub fn index(&self, word: &str) -> usize {
        self.w2i.get(word).copied().unwrap_or(0)
    }

    pub fn word_vec_norm(&self, word: &str) -> ArrayView1<V> {
        self.word_vecs_norm.row(self.index(word))
    }

    pub fn ctx_vec_norm(&self, word: &str) -> ArrayView1<V> {
        self.ctx_vecs_norm.row(self.index(word))
    }

    /// Normalized context matrix for the window around `ind`, one row per
    /// context token, sentinel rows for unknown tokens.
    pub fn context_matrix(&self, toks: &[String], ind: usize, cwin: usize) -> Array<V, Ix2> {
        let context = context_window(toks, ind, cwin);
        let mut c = Array::zeros((context.len(), self.dim));
        for (i, tok) in context.iter().enumerate() {
            c.row_mut(i).assign(&self.ctx_vec_norm(tok));
        }
        c
    }

    pub fn load_model(path: &str) -> Result<EmbeddingTable, Box<dyn std::error::Error>> {
        let mut rf = std::io::BufReader::new(
            std::fs::File::open(path)?
        );

        let mut line = String::new();

        rf.read_line(&mut line)?;
        let parts: Vec<_> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err("bad header format on line 1".into());
        }

        let lexsize = parts[0].parse::<usize>()?;
        let dim = parts[1].parse::<usize>()?;

        let mut words = Vec::<(String, u64)>::with_capacity(lexsize);
        let mut word_vecs = Array::<V, Ix2>::zeros((lexsize, dim));
        let mut ctx_vecs = Array::<V, Ix2>::zeros((lexsize, dim));

        let mut buf = [0u8; 4];
        for i in 0..lexsize {
            line.clear();
            rf.read_line(&mut line)?;
            let (word, count) = match line.trim_end().rsplit_once(' ') {
                Some((w, c)) => (w.to_string(), c.parse::<u64>()?),
                None => return Err(format!("bad word record at entry {}", i).into()),
            };
            words.push((word, count));

            for k in 0..dim {
                rf.read_exact(&mut buf)?;
                word_vecs[[i, k]] = f32::from_le_bytes(buf);
            }
            line.clear();
            rf.read_line(&mut line)?;
            if line.trim() != "" {
                return Err("trailing characters after binary word vector".into());
            }

            for k in 0..dim {
                rf.read_exact(&mut buf)?;
                ctx_vecs[[i, k]] = f32::from_le_bytes(buf);
            }
            line.clear();
            rf.read_line(&mut line)?;
            if line.trim() != "" {
                return Err("trailing characters after binary context vector".into());
            }
        }

        Ok(EmbeddingTable::from_raw(words, word_vecs, ctx_vecs))
    }

    pub fn save_model(&self, vecf: &mut std::fs::File, words: &[(String, u64)])
            -> Result<(), Box<dyn std::error::Error>> {
        let mut vecwr = std::io::BufWriter::new(vecf);
        writeln!(vecwr, "{} {}", words.len(), self.dim)?;

        for (i, (word, count)) in words.iter().enumerate() {
            writeln!(vecwr, "{} {}", word, count)?;
            for e in self.word_vecs.slice(s![i + 1, ..]).iter() {
                vecwr.write_all(&e.to_le_bytes())?;
            }
            writeln!(vecwr)?;
            for e in self.ctx_vecs.slice(s![i + 1, ..]).iter() {
                vecwr.write_all(&e.to_le_bytes())?;
            }
            writeln!(vecwr)?;
        }
        vecwr.flush()?;
        Ok(())
    }

    pub fn save_model_atomic(&self, path: &str, words: &[(String, u64)])
            -> Result<(), Box<dyn std::error::Error>> {
        let tmppath = path.to_string() + ".tmp";
        let mut vecf = std::fs::File::create(&tmppath)?;

        self.save_model(&mut vecf, words)?;
        std::mem::drop(vecf);
        std::fs::rename(tmppath, path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::embedding::*;
    use ndarray::prelude::*;

    fn toy_table() -> (Vec<(String, u64)>, EmbeddingTable) {
        let words = vec![("bug_NN".to_string(), 6), ("insect_NN".to_string(), 3),
                         ("glitch_NN".to_string(), 1)];
        let word_vecs = array![[3., 0.], [0., 2.], [1., 1.]];
        let ctx_vecs = array![[0., 1.], [1., 0.], [2., 2.]];
        let t = EmbeddingTable::from_raw(words.clone(), word_vecs, ctx_vecs);
        (words, t)
    }

    #[test]
    fn test_sentinel_row() {
        let (_, t) = toy_table();
        assert_eq!(t.index("bug_NN"), 1);
        assert_eq!(t.index("nonsense"), 0);
        assert!(t.word_vecs.row(0).iter().all(|&x| x == 0.));
        assert!(t.word_vecs_norm.row(0).iter().all(|&x| x == 0.));
        assert!(t.ctx_vecs.row(0).iter().all(|&x| x == 0.));
        assert!(t.ctx_vecs_norm.row(0).iter().all(|&x| x == 0.));
        assert!(t.word_vec_norm("nonsense").iter().all(|&x| x == 0.));
    }

    #[test]
    fn test_normalization() {
        let (_, t) = toy_table();
        // raw vectors untouched beyond the shift
        assert_eq!(t.word_vecs.row(1), array![3., 0.].view());
        // normalized rows are unit length
        for i in 1..=t.lexsize() {
            let n = norm_l2(&t.word_vecs_norm.row(i));
            assert!((n - 1.).abs() < 1e-6);
            let n = norm_l2(&t.ctx_vecs_norm.row(i));
            assert!((n - 1.).abs() < 1e-6);
        }
    }

    #[test]
    fn test_frequencies_sum_to_one() {
        let (_, t) = toy_table();
        let total: f64 = t.w2f.values().sum();
        assert!((total - 1.).abs() < 1e-12);
        assert_eq!(t.w2f["bug_NN"], 0.6);
    }

    #[test]
    fn test_empty_vocabulary() {
        let t = EmbeddingTable::from_raw(vec![], Array::zeros((0, 4)), Array::zeros((0, 4)));
        assert_eq!(t.lexsize(), 0);
        assert_eq!(t.index("anything"), 0);
        assert!(t.word_vec_norm("anything").iter().all(|&x| x == 0.));
    }

    #[test]
    fn test_context_matrix_uses_sentinel() {
        let (_, t) = toy_table();
        let toks: Vec<String> = ["unknown_XX", "bug_NN", "insect_NN"]
            .iter().map(|s| s.to_string()).collect();
        let c = t.context_matrix(&toks, 1, 2);
        assert_eq!(c.dim(), (2, 2));
        // unknown context token resolves to the sentinel zero row
        assert!(c.row(0).iter().all(|&x| x == 0.));
        assert_eq!(c.row(1), t.ctx_vecs_norm.row(2));
    }

    #[test]
    fn test_save_load_round_trip() {
        let (words, t) = toy_table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let path = path.to_str().unwrap();
        t.save_model_atomic(path, &words).unwrap();

        let t2 = EmbeddingTable::load_model(path).unwrap();
        assert_eq!(t2.dim, t.dim);
        assert_eq!(t2.w2i, t.w2i);
        assert_eq!(t2.word_vecs, t.word_vecs);
        assert_eq!(t2.ctx_vecs, t.ctx_vecs);
        assert_eq!(t2.word_vecs_norm, t.word_vecs_norm);
        assert_eq!(t2.w2f, t.w2f);
    }
}
