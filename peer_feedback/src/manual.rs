/*!

This is the long-form manual for `peer_feedback` and `peerfb`.

## The master document

Everything starts from one spreadsheet, the master document. It contains:

* a roster sheet (`Names` by default). The first column lists the team members, one
  per row starting at row 2. The two following columns are filled by `peerfb provision`
  with the URLs of the Input and Results documents of every member.
* an Input template sheet. This is the form that every member fills, once per
  colleague. Each row is a question: the topic in one column, the rating (a whole
  number) and the free-text comment in two other columns. Row 1 is a header.
* a Results template sheet, with one row per question, where the aggregates are
  written: the mean and the standard deviation of the ratings of the peers, the
  rating that the member gave themself, and the merged comments of the peers.

Example of an Input template:

|   | A             | B      | C       |
|---|---------------|--------|---------|
| 1 | Topic         | Rating | Comment |
| 2 | Communication |        |         |
| 3 | Delivery      |        |         |

The number of questions is found by reading the topic column down to its last
populated cell (500 rows are scanned by default, see `discovery_rows`). The last
question must then be on the last populated row of that column.

## Provisioning

For every member of the roster, two documents are created. Their title is derived
from the title of the master document: the first occurrence of `Master` is replaced
by `<name> - Input` or `<name> - Results`. For example, `Feedback Master 2024` gives
`Feedback Alice - Input 2024`.

* The Input document has one copy of the Input template per colleague, named after
  the colleague, and one more named `Yourself` for the self-assessment.
* The Results document has one copy of the Results template, named `Results`.

The people listed in `master_users` are given write access to every document.

New documents may not accept permission changes right away. The `readiness` policy
tells how long to wait:

* `{"kind": "immediate"}` does not wait.
* `{"kind": "fixed", "delay_ms": 15000}` pauses once. This is the default.
* `{"kind": "backoff", "initial_delay_ms": 500, "factor": 2, "max_attempts": 6}` asks
  the store until the document is ready, and fails after the last attempt.

## Aggregation

For each member (the subject), the answers of every other member (the raters) about
the subject are read from the sheet named after the subject in the rater's Input
document. Answers are aligned question by question: a rater who did not answer the
last questions counts as an empty answer for them.

For each question:

* the mean of the ratings given, or an empty cell without any rating;
* the sample standard deviation, or an empty cell with fewer than two ratings;
* the comments, shuffled then joined with `; `. Empty comments are dropped.

The shuffle hides who wrote what. Pass `--seed` to make it reproducible.

## Configuration

The configuration is a JSON file:

```json
{
  "master_users": ["lead@example.com"],
  "input": {
    "sheet_name": "Input",
    "topics_col": "A",
    "rating_col": "B",
    "comment_col": "C"
  },
  "results": {
    "sheet_name": "Results template",
    "topics_col": "A",
    "team_rating_mean_col": "B",
    "team_rating_stddev_col": "C",
    "own_rating_col": "D",
    "team_comment_col": "E"
  },
  "readiness": {"kind": "fixed", "delay_ms": 15000}
}
```

`oww_rating_col` is accepted as another name for `own_rating_col`. The optional
`roster` section moves the roster elsewhere:

```json
"roster": {
  "sheet_name": "Names",
  "name_col": "A",
  "input_url_col": "B",
  "results_url_col": "C",
  "first_row": 2,
  "last_row": 100
}
```

The three roster columns must follow each other.

## Command line

The documents live in a JSON workspace file, passed with `--store`.

```text
peerfb import --xlsx master.xlsx --store team.json --title "Feedback Master 2024"
peerfb provision --master local-000001 --config feedback.json --store team.json
peerfb aggregate --master local-000001 --config feedback.json --store team.json --seed 3 --out stdout
```

`import` prints the id of the new master document. `provision` prints one line per
member with the URLs of their documents. `aggregate` can write a JSON summary of all
the aggregates with `--out`, and compare it to a previous summary with `--reference`:
any difference is printed and the command fails.

Use `--verbose` or the `RUST_LOG` environment variable to see what is going on.

*/
