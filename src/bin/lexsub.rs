use std::collections::HashSet;
use std::io::Write;

use addcos::embedding::EmbeddingTable;
use addcos::lexsub::{lexsub_score_list, rank_substitutes, result_str, select_candidates};
use addcos::ppdb::fetch_scored_pp_lists;
use addcos::sentences::read_semeval_tsv;
use addcos::word_pos::{get_base_form, read_word_pos};

use clap::Parser;

const VERSION: &str = git_version::git_version!(args=["--tags", "--always", "--dirty"], fallback="unknown");

/// Rank lexical substitution candidates with the AddCos metric, taking
/// candidates from the PPDB paraphrases of each target word
#[derive(Parser, Debug)]
#[clap(author, version=VERSION, about)]
struct Args {
    /// tab-separated test instances: target.P, id, target index, tagged tokens
    sentences: String,

    /// PPDB lexical paraphrase file, plain text or gzipped
    ppdb: String,

    /// embedding model path
    model: String,

    /// destination file for ranked substitutes
    out: String,

    /// minimum PPDB score for a paraphrase to be considered a substitute
    #[clap(default_value_t = 0.0)]
    min_score: f32,

    /// context window size on each side of the target
    #[clap(long, default_value_t = 2usize)]
    window: usize,

    /// keep only the top K substitutes per instance
    #[clap(long)]
    top: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // load sentences and targets
    let sents = read_semeval_tsv(&args.sentences)?;

    // query vocabulary: every tagged target plus its base form
    let mut vocab = HashSet::new();
    for sent in &sents {
        vocab.insert(sent.orig_target().to_string());
        vocab.insert(get_base_form(&sent.target)?);
    }
    let wplist: Vec<_> = vocab.iter().map(|w| read_word_pos(w)).collect();

    let ppdblist = fetch_scored_pp_lists(&wplist, &args.ppdb, &["PPDB2.0Score"],
                                         true, None)?;

    // candidate substitutions per instance, before loading the model
    let mut candidates = Vec::with_capacity(sents.len());
    for sent in &sents {
        candidates.push(select_candidates(sent.orig_target(), &sent.target,
                                          &ppdblist, args.min_score)?);
    }

    eprintln!("loading {}", args.model);
    let table = EmbeddingTable::load_model(&args.model)?;
    eprintln!("ready");

    let mut fout = std::io::BufWriter::new(std::fs::File::create(&args.out)?);
    for (sent, cands) in sents.iter().zip(&candidates) {
        let scored = lexsub_score_list(&sent.toks, sent.index, cands, &table, args.window);
        let ranked = rank_substitutes(scored, args.top);
        writeln!(fout, "{}", result_str(sent.id, &sent.target, &ranked))?;
    }
    fout.flush()?;

    Ok(())
}
