/// Coordination of sample processing between tasks
///
/// The pool of process tasks (threads) request jobs from and return processed
/// results to the controller.  The tasks return any results from a previous job (if existing)
/// and request a new job.  If no more jobs are available then None is returned, and the child
/// tasks will exit.
///
/// A job is a complete sample: the depth report is decoded, projected onto the transcript models
/// and summarized, and the per sample output files are written.  The transcript models are
/// read before any task is started and are shared (read only) by all tasks.
///
/// A failure in one sample is reported back to the controller and does not stop the
/// processing of the other samples.
use std::{
    fmt,
    io::Write,
    panic::{catch_unwind, AssertUnwindSafe},
    thread,
};

use anyhow::Context;
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::{
    aggregate::aggregate,
    config::Config,
    coverage::read_coverage_file,
    output::*,
    error::SkipStats,
    project::project_each,
    sample::Sample,
    summary::SampleSummary,
    transcript::{read_transcript_file, TranscriptSet},
};

/// The child tasks send their results as Completed objects
pub enum Completed {
    Sample(usize, anyhow::Result<SampleSummary>), // (sample id, summary or error)
    None, // This is returned initially, before a task has received a job
}

impl fmt::Debug for Completed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample(i, Ok(_)) => write!(f, "Completed::Sample({}, Ok)", *i),
            Self::Sample(i, Err(_)) => write!(f, "Completed::Sample({}, Err)", *i),
            Self::None => f.write_str("Completed::None"),
        }
    }
}

/// Sent from child tasks to request a new job
#[derive(Debug)]
pub struct JobRequest {
    pub prev_results: Completed, // Returned results from previous job by this task
    pub task_idx: usize, // Id of task (used to select the channel to send the reply back to)
}

/// Sent to child task in response to a JobRequest
#[derive(Debug)]
pub struct Job {
    pub sample_idx: usize, // The sample that will be processed
}

/// Decode, project and summarize one sample, writing the per sample output files.
///
/// Coverage arrays and transcript profiles are dropped before returning; only the
/// summary is kept
pub fn process_sample(
    cfg: &Config,
    sample: &Sample,
    tset: &TranscriptSet,
) -> anyhow::Result<SampleSummary> {
    let name = sample.name();
    info!("Processing sample {}", name);
    let cmap = read_coverage_file(sample.cov_path(), cfg.first_record())
        .with_context(|| format!("Error reading coverage data for sample {}", name))?;

    let mut summary = SampleSummary::new(name);
    let p = get_file_path(cfg, name, PROFILE_SUFFIX);
    let mut wrt = open_output(&p)?;
    let mut stats = SkipStats::default();
    project_each(&cmap, tset.sorted(), cfg.exon_order(), &mut stats, |tr, prof| {
        write_profile(&mut wrt, tr.id(), &prof)
            .with_context(|| format!("Error writing to {}", p.display()))?;
        if let Err(e) = summary.add_profile(tr.id(), &prof, cfg.mincov(), cfg.cutoff()) {
            warn!("{}: {}", name, e)
        }
        anyhow::Ok(())
    })?;
    summary.stats_mut().merge(&stats);
    wrt.flush()
        .with_context(|| format!("Error writing to {}", p.display()))?;
    drop(cmap);

    info!("{}: {}", name, summary.stats());
    output_sample_summary(cfg, &summary)?;
    Ok(summary)
}

fn panic_message(e: &(dyn std::any::Any + Send)) -> &str {
    e.downcast_ref::<&str>()
        .copied()
        .or_else(|| e.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown cause")
}

fn process_task(
    cfg: &Config,
    tset: &TranscriptSet,
    ix: usize,
    snd: Sender<JobRequest>,
    recv: Receiver<Option<Job>>,
) -> anyhow::Result<()> {
    debug!("Process task {} starting up", ix);
    snd.send(JobRequest {
        prev_results: Completed::None,
        task_idx: ix,
    })?;

    while let Some(job) = recv.recv()? {
        trace!("Task {} received job {:?}", ix, job);
        let i = job.sample_idx;
        let sample = &cfg.sample_list()[i];
        // A panic only fails the current sample
        let res = catch_unwind(AssertUnwindSafe(|| process_sample(cfg, sample, tset)))
            .unwrap_or_else(|e| Err(anyhow!("Panic while processing: {}", panic_message(&*e))));
        snd.send(JobRequest {
            prev_results: Completed::Sample(i, res),
            task_idx: ix,
        })?;
    }
    debug!("Process task {} closing down", ix);
    Ok(())
}

/// Main loop.  Receives messages from child tasks and allocates samples.  Will
/// end when channel r is closed (i.e., when all child tasks exit).  Returns the result
/// for each sample; None if the sample was never completed
fn controller(
    cfg: &Config,
    r: Receiver<JobRequest>,
    svec: Vec<Sender<Option<Job>>>,
) -> Vec<Option<anyhow::Result<SampleSummary>>> {
    debug!("Controller thread starting up");

    let samples = cfg.sample_list();
    let mut results: Vec<_> = samples.iter().map(|_| None).collect();
    let mut next_sample = 0;

    while let Ok(jr) = r.recv() {
        trace!("Controller received request {:?}", jr);

        if let Completed::Sample(i, res) = jr.prev_results {
            if let Err(e) = res.as_ref() {
                error!("Processing failed for sample {}: {:#}", samples[i].name(), e)
            }
            results[i] = Some(res)
        }

        let job = if next_sample < samples.len() {
            next_sample += 1;
            Some(Job {
                sample_idx: next_sample - 1,
            })
        } else {
            None
        };

        trace!(
            "Controller sending back job {:?} for task {}",
            job,
            jr.task_idx
        );
        if svec[jr.task_idx - 1].send(job).is_err() {
            warn!("Could not send job to task {}", jr.task_idx)
        }
    }
    debug!("Controller thread closing down");
    results
}

/// Load transcript models, then create child threads to process samples.  When all
/// samples are finished the per sample histograms are collected and output.
///
/// Returns the summaries of all samples, or an error if any sample failed.  The
/// comparative output for the successful samples is written in either case
pub fn process_samples(cfg: &Config) -> anyhow::Result<Vec<SampleSummary>> {
    // Annotation errors are fatal for the whole run
    let tset = read_transcript_file(cfg.gff(), cfg.id_tag())
        .with_context(|| "Error reading transcript models")?;
    info!("Number of transcripts found: {}", tset.len());
    if tset.is_empty() {
        warn!("No transcripts found in {}", cfg.gff().display())
    }

    setup_output(cfg)?;

    let tset = &tset;
    let ns = cfg.sample_list().len();
    let nt = cfg.threads().min(ns).max(1);
    debug!("Starting {} process tasks for {} samples", nt, ns);

    let results = thread::scope(|sc| {
        // Channel for a task to request a new job
        let (send_ctrl, recv_ctrl) = bounded(nt * 8);

        // Storage for channels by which a task receives a new job
        let mut send_job = Vec::with_capacity(nt);

        // Spawn task processes
        let join_handles: Vec<_> = (0..nt)
            .map(|ix| {
                let (s, r) = bounded(1);
                send_job.push(s);
                let s = send_ctrl.clone();
                sc.spawn(move || process_task(cfg, tset, ix + 1, s, r))
            })
            .collect();

        // Only the tasks hold senders now, so the controller finishes when they exit
        drop(send_ctrl);

        let control_jh = sc.spawn(|| controller(cfg, recv_ctrl, send_job));

        for (ix, jh) in join_handles.into_iter().enumerate() {
            match jh.join() {
                Ok(Err(e)) => error!("Process task {} exited with error: {:#}", ix + 1, e),
                Err(_) => error!("Process task {} panicked", ix + 1),
                Ok(Ok(())) => (),
            }
        }
        control_jh
            .join()
            .map_err(|_| anyhow!("Controller thread panicked"))
    })?;

    let mut summaries = Vec::with_capacity(ns);
    let mut failed = Vec::new();
    for (s, r) in cfg.sample_list().iter().zip(results) {
        match r {
            Some(Ok(x)) => summaries.push(x),
            _ => failed.push(s.name()),
        }
    }

    if !summaries.is_empty() {
        let hist = aggregate(&summaries);
        for (name, h) in hist.iter() {
            debug!("{}: {:?}", name, &h[..])
        }
        output_comparative(cfg, &hist)?;
    }

    if failed.is_empty() {
        Ok(summaries)
    } else {
        Err(anyhow!(
            "Processing failed for {} sample(s): {}",
            failed.len(),
            failed.join(", ")
        ))
    }
}
